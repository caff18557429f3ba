//! `RoomRegistry`: creates, finds, and destroys rooms.
//!
//! The registry is plain data; the server wraps it in a
//! `tokio::sync::Mutex`. Methods that talk to a room task are `async` and
//! await its reply, so a create/join/leave is complete, membership on both
//! sides included, before the lock is released.

use std::collections::HashMap;

use partyroom_modes::{GameMode, PlayerAction, PlayerPatch};
use partyroom_protocol::{PlayerId, RoomCode, RoomSnapshot, ServerMessage};
use partyroom_session::{PlayerRegistry, PlayerSender, SessionError};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::code::generate_code;
use crate::room::spawn_room;
use crate::{Control, Member, RoomConfig, RoomError, RoomHandle};

pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    players: PlayerRegistry,
    config: RoomConfig,
    rng: StdRng,
    /// Rooms created so far; mixed into per-room seeds.
    created: u64,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rooms: HashMap::new(),
            players: PlayerRegistry::new(),
            config,
            rng,
            created: 0,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Registers a new connection. The player starts outside any room.
    pub fn connect(&mut self, outbox: PlayerSender) -> PlayerId {
        self.players.register(outbox)
    }

    /// Leaves the player's room, if any, and forgets the player.
    pub async fn disconnect(&mut self, player_id: PlayerId) {
        self.leave_room(player_id).await;
        self.players.remove(player_id);
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Creates a room owned by `player_id` and sends them `room_created`.
    ///
    /// A player already in a room leaves it first.
    pub async fn create_room(
        &mut self,
        player_id: PlayerId,
        username: &str,
        mode: GameMode,
    ) -> Result<RoomCode, RoomError> {
        self.leave_room(player_id).await;
        let owner = self.member(player_id, username)?;

        let code = generate_code(&mut self.rng, |c| self.rooms.contains_key(c))?;
        self.created += 1;
        let config = RoomConfig {
            rng_seed: self.config.rng_seed.map(|s| s.wrapping_add(self.created)),
            ..self.config.clone()
        };
        let handle = spawn_room(code.clone(), mode, config, owner);
        self.rooms.insert(code.clone(), handle);
        self.players.assign_room(player_id, code.clone())?;

        tracing::info!(room_code = %code, %mode, owner = %player_id, "room created");
        self.players.send_to(
            player_id,
            ServerMessage::RoomCreated {
                room_code: code.clone(),
            },
        );
        Ok(code)
    }

    /// Adds `player_id` to the room `raw_code` and sends them `room_joined`.
    ///
    /// Fails with `NotFound`, `RoomFull` or `GameInProgress`, leaving every
    /// room unchanged. On success a player who was in another room leaves
    /// it.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        username: &str,
        raw_code: &str,
    ) -> Result<RoomSnapshot, RoomError> {
        let code = RoomCode::parse(raw_code).ok_or_else(|| RoomError::NotFound(raw_code.to_string()))?;
        let handle = self
            .rooms
            .get(&code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;

        let previous = self.players.room_of(player_id).cloned();
        let member = self.member(player_id, username)?;
        let snapshot = match handle.join(member).await {
            Ok(snapshot) => snapshot,
            Err(RoomError::Unavailable(code)) => {
                self.rooms.remove(&code);
                return Err(RoomError::NotFound(code.to_string()));
            }
            Err(e) => return Err(e),
        };

        if previous.as_ref().is_some_and(|prev| *prev != code) {
            self.leave_room(player_id).await;
        }
        self.players.assign_room(player_id, code)?;
        self.players
            .send_to(player_id, ServerMessage::RoomJoined(snapshot.clone()));
        Ok(snapshot)
    }

    /// Removes the player from their room. Does nothing if they are not in
    /// one. A room left empty is destroyed.
    pub async fn leave_room(&mut self, player_id: PlayerId) {
        let Some(code) = self.players.clear_room(player_id) else {
            return;
        };
        let Some(handle) = self.rooms.get(&code) else {
            return;
        };
        let remaining = handle.leave(player_id).await;
        match remaining {
            Ok(0) | Err(_) => {
                self.rooms.remove(&code);
                tracing::info!(room_code = %code, "room destroyed");
            }
            Ok(_) => {}
        }
    }

    // -----------------------------------------------------------------------
    // Owner controls
    // -----------------------------------------------------------------------

    /// True only if `player_id` is the first member of `code`.
    pub async fn require_owner(&self, player_id: PlayerId, code: &RoomCode) -> bool {
        let Some(handle) = self.rooms.get(code) else {
            return false;
        };
        match handle.snapshot().await {
            Ok(snapshot) => snapshot.owner() == Some(player_id),
            Err(_) => false,
        }
    }

    pub async fn start_game(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.control(player_id, Control::Start).await
    }

    pub async fn play_again(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.control(player_id, Control::PlayAgain).await
    }

    pub async fn return_to_lobby(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.control(player_id, Control::ReturnToLobby).await
    }

    async fn control(&self, player_id: PlayerId, control: Control) -> Result<(), RoomError> {
        self.room_handle_for(player_id)
            .ok_or(RoomError::NotInRoom(player_id))?
            .control(player_id, control)
            .await
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// The handle of the player's current room.
    ///
    /// Lets the caller send high-frequency input after releasing the
    /// registry lock.
    pub fn room_handle_for(&self, player_id: PlayerId) -> Option<RoomHandle> {
        let code = self.players.room_of(player_id)?;
        self.rooms.get(code).cloned()
    }

    pub async fn submit_update(&self, player_id: PlayerId, patch: PlayerPatch) -> Result<(), RoomError> {
        self.room_handle_for(player_id)
            .ok_or(RoomError::NotInRoom(player_id))?
            .submit_update(player_id, patch)
            .await
    }

    pub async fn submit_action(&self, player_id: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        self.room_handle_for(player_id)
            .ok_or(RoomError::NotInRoom(player_id))?
            .submit_action(player_id, action)
            .await
    }

    pub async fn relay_chat(&self, player_id: PlayerId, content: String) -> Result<(), RoomError> {
        self.room_handle_for(player_id)
            .ok_or(RoomError::NotInRoom(player_id))?
            .chat(player_id, content)
            .await
    }

    /// Forwards a signaling message straight to another connection.
    /// Returns `false` if `to` is not connected.
    pub fn relay_signal(&self, to: PlayerId, msg: ServerMessage) -> bool {
        self.players.send_to(to, msg)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self, code: &RoomCode) -> Option<RoomSnapshot> {
        self.rooms.get(code)?.snapshot().await.ok()
    }

    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomCode> {
        self.players.room_of(player_id).cloned()
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    fn member(&mut self, player_id: PlayerId, username: &str) -> Result<Member, SessionError> {
        let username = self.players.set_username(player_id, username)?;
        let outbox = self
            .players
            .sender(player_id)
            .cloned()
            .ok_or(SessionError::NotFound(player_id))?;
        Ok(Member {
            id: player_id,
            username,
            outbox,
        })
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
