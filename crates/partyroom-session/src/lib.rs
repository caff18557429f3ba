//! # partyroom-session
//!
//! Tracks who is connected: one [`Player`] per live connection, holding
//! their display name, the room they are in (if any), and the outbox the
//! rest of the server uses to reach them.
//!
//! The registry is plain data with no locking of its own; the server keeps
//! it inside the room registry, behind the same lock.

mod error;
mod player;
mod registry;

pub use error::SessionError;
pub use player::{MAX_USERNAME_CHARS, Player, PlayerSender, deliver, normalize_username};
pub use registry::PlayerRegistry;
