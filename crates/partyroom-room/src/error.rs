//! Error types for the room system.

use partyroom_protocol::{PlayerId, RoomCode, RoomErrorKind};
use partyroom_session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code. Holds the code as the client typed it.
    #[error("room {0} not found")]
    NotFound(String),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("room {0} already has a game in progress")]
    GameInProgress(RoomCode),

    #[error("player {0} is not the room owner")]
    NotOwner(PlayerId),

    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// Start requested while the game loop is already running.
    #[error("room {0} is already running a game")]
    AlreadyRunning(RoomCode),

    /// Play-again or return-to-lobby requested from the lobby.
    #[error("room {0} has no game to reset")]
    NotPlaying(RoomCode),

    #[error("could not find a free room code")]
    CodesExhausted,

    /// The room task has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RoomError {
    /// The client-facing category, for errors reported to the requester.
    ///
    /// `None` means the error is not reported to clients.
    pub fn kind(&self) -> Option<RoomErrorKind> {
        match self {
            Self::NotFound(_) | Self::Unavailable(_) => Some(RoomErrorKind::RoomNotFound),
            Self::RoomFull(_) => Some(RoomErrorKind::RoomFull),
            Self::GameInProgress(_) => Some(RoomErrorKind::GameInProgress),
            _ => None,
        }
    }

    /// The message shown to players.
    pub fn client_message(&self) -> &'static str {
        match self.kind() {
            Some(RoomErrorKind::RoomNotFound) => "Room not found",
            Some(RoomErrorKind::RoomFull) => "Room is full",
            Some(RoomErrorKind::GameInProgress) => "Game already in progress",
            None => "Request failed",
        }
    }
}
