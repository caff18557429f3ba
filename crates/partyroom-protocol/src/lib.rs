//! # partyroom-protocol
//!
//! The message contract between browser clients and the Partyroom server.
//!
//! Every frame on the wire is a JSON object of the form
//!
//! ```text
//! { "event": "<snake_case name>", "data": <payload> }
//! ```
//!
//! where `data` is left out for events that carry nothing. Inbound frames
//! decode into [`ClientMessage`], outbound ones are built from
//! [`ServerMessage`]. Game state payloads come straight from
//! `partyroom-modes`.

mod codec;
mod error;
mod messages;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{ChatLine, ClientMessage, ServerMessage};
pub use types::{MemberInfo, RoomCode, RoomErrorKind, RoomSnapshot};

pub use partyroom_modes::{GameMode, GameState, Outcome, PlayerAction, PlayerId, PlayerPatch};
