//! # Partyroom
//!
//! Authoritative multiplayer server for browser party games.
//!
//! Players connect over WebSocket, gather in rooms under short codes, and
//! play one of four mini-game modes. Each room runs its own fixed-rate game
//! loop and broadcasts the canonical state to its members.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use partyroom::prelude::*;
//!
//! # async fn run() -> Result<(), PartyroomError> {
//! let server = PartyroomServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{
    ENV_BIND, ENV_MAX_MEMBERS, ENV_OUTBOX_CAPACITY, ENV_TICK_RATE, ServerConfig,
};
pub use error::PartyroomError;
pub use server::{PartyroomServer, PartyroomServerBuilder};

pub mod prelude {
    pub use crate::{PartyroomError, PartyroomServer, PartyroomServerBuilder, ServerConfig};

    pub use partyroom_protocol::{
        ChatLine, ClientMessage, GameMode, GameState, MemberInfo, Outcome, PlayerAction, PlayerId,
        PlayerPatch, RoomCode, RoomErrorKind, RoomSnapshot, ServerMessage,
    };
    pub use partyroom_room::RoomConfig;
}
