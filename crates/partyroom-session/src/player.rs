//! A connected player and the channel used to reach them.

use partyroom_protocol::{PlayerId, RoomCode, ServerMessage};
use tokio::sync::mpsc;

/// Outbound queue for one connection.
///
/// Bounded: a writer task drains it into the socket. Producers use
/// `try_send`, so a slow client loses messages instead of stalling a room.
pub type PlayerSender = mpsc::Sender<ServerMessage>;

/// Longest username kept, in characters. Longer names are cut.
pub const MAX_USERNAME_CHARS: usize = 24;

const DEFAULT_USERNAME: &str = "Player";

/// Cleans up a client-supplied display name.
///
/// Whitespace is trimmed and the result capped at
/// [`MAX_USERNAME_CHARS`]. A blank name becomes `"Player"`.
pub fn normalize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_USERNAME.to_string();
    }
    trimmed
        .chars()
        .take(MAX_USERNAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// One live connection.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// Display name, not unique. Set on create/join.
    pub username: String,
    /// The room this player is currently a member of.
    pub room: Option<RoomCode>,
    pub outbox: PlayerSender,
}

impl Player {
    /// Queues `msg` for this player without waiting.
    ///
    /// Returns `false` if the outbox is full or the connection is gone;
    /// the message is dropped either way.
    pub fn send(&self, msg: ServerMessage) -> bool {
        deliver(self.id, &self.outbox, msg)
    }
}

/// Queues `msg` on `outbox` without waiting. See [`Player::send`].
pub fn deliver(id: PlayerId, outbox: &PlayerSender, msg: ServerMessage) -> bool {
    match outbox.try_send(msg) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(msg)) => {
            tracing::warn!(player_id = %id, event = msg.event(), "outbox full, dropping message");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::trace!(player_id = %id, "outbox closed");
            false
        }
    }
}
