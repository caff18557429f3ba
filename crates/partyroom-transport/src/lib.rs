//! # partyroom-transport
//!
//! Moves frames between the server and browsers.
//!
//! A connection is used from two places at once: the handler task reads
//! client frames while a writer task pushes server frames out. So every
//! [`Connection`] is [`split`](Connection::split) into an independent
//! [`FrameReader`] and [`FrameWriter`], and neither half ever waits on
//! the other.
//!
//! ```text
//!   WebSocketListener::accept ──→ PendingUpgrade::upgrade ──→ WebSocketConnection
//!                                                                 │ split()
//!                                                     ┌───────────┴───────────┐
//!                                               WebSocketReader        WebSocketWriter
//!                                              (handler task)          (writer task)
//! ```

mod error;
mod websocket;

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

pub use error::TransportError;
pub use websocket::{
    PendingUpgrade, WebSocketConnection, WebSocketListener, WebSocketReader, WebSocketWriter,
};

/// Process-unique id for one accepted connection. Used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An established, message-oriented connection.
pub trait Connection: Send + 'static {
    type Reader: FrameReader;
    type Writer: FrameWriter;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;

    /// Separates the connection into halves that can live in different
    /// tasks.
    fn split(self) -> (Self::Reader, Self::Writer);
}

/// The receiving half of a connection.
pub trait FrameReader: Send + 'static {
    /// Next data frame as raw bytes (text or binary).
    ///
    /// `Ok(None)` means the peer closed the connection cleanly. Control
    /// frames are handled internally and never returned.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;
}

/// The sending half of a connection.
pub trait FrameWriter: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a close frame. Errors are expected if the peer already left.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        assert_eq!(ConnectionId::new(42).into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }
}
