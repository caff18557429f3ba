//! Error types for the player registry.

use partyroom_protocol::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no connected player {0}")]
    NotFound(PlayerId),
}
