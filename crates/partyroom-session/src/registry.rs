//! `PlayerRegistry`: every connected player, keyed by id.

use std::collections::HashMap;

use partyroom_protocol::{PlayerId, RoomCode, ServerMessage};

use crate::{Player, PlayerSender, SessionError, normalize_username};

/// Maps live connections to player identities.
///
/// Ids are handed out sequentially starting at 1 and never reused within
/// one registry, so a stale id held by a lagging task can never address a
/// newer connection.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
    next_id: u64,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and returns its id.
    ///
    /// The player starts outside any room with the default username.
    pub fn register(&mut self, outbox: PlayerSender) -> PlayerId {
        self.next_id += 1;
        let id = PlayerId(self.next_id);
        self.players.insert(
            id,
            Player {
                id,
                username: normalize_username(""),
                room: None,
                outbox,
            },
        );
        tracing::info!(player_id = %id, "player registered");
        id
    }

    /// Removes a player. Returns their record, or `None` if already gone.
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        tracing::info!(player_id = %id, "player removed");
        Some(player)
    }

    /// Normalizes and stores a new display name, returning the stored value.
    pub fn set_username(&mut self, id: PlayerId, raw: &str) -> Result<String, SessionError> {
        let player = self.get_mut(id)?;
        player.username = normalize_username(raw);
        Ok(player.username.clone())
    }

    /// Records that `id` is now in `code`.
    pub fn assign_room(&mut self, id: PlayerId, code: RoomCode) -> Result<(), SessionError> {
        let player = self.get_mut(id)?;
        tracing::debug!(player_id = %id, room_code = %code, "room assigned");
        player.room = Some(code);
        Ok(())
    }

    /// Clears `id`'s room, returning the room they were in.
    pub fn clear_room(&mut self, id: PlayerId) -> Option<RoomCode> {
        self.players.get_mut(&id)?.room.take()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn room_of(&self, id: PlayerId) -> Option<&RoomCode> {
        self.players.get(&id)?.room.as_ref()
    }

    pub fn sender(&self, id: PlayerId) -> Option<&PlayerSender> {
        self.players.get(&id).map(|p| &p.outbox)
    }

    /// Queues a message for one player. Unknown ids are ignored.
    pub fn send_to(&self, id: PlayerId, msg: ServerMessage) -> bool {
        self.players.get(&id).is_some_and(|p| p.send(msg))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, SessionError> {
        self.players.get_mut(&id).ok_or(SessionError::NotFound(id))
    }
}
