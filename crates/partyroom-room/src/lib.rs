//! # partyroom-room
//!
//! Rooms and the games that run inside them.
//!
//! - [`RoomRegistry`] is the front door: it creates rooms under fresh
//!   codes, routes players in and out, and forgets rooms the moment their
//!   last member leaves. It also owns the
//!   [`PlayerRegistry`](partyroom_session::PlayerRegistry), so a player's
//!   room membership and the room's member list change together.
//! - Each room is an actor task behind a [`RoomHandle`]. It owns the
//!   member list, the lobby/running/finished phase, and, while a game runs,
//!   the game state and its tick scheduler.
//!
//! ```text
//!   handler ──→ RoomRegistry ──→ RoomHandle ──mpsc──→ room task ──try_send──→ player outboxes
//! ```

mod code;
mod config;
mod error;
mod manager;
mod room;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use room::{Control, Member, NOT_ENOUGH_PLAYERS, RoomHandle};
