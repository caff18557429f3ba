//! Error types for the transport layer.

use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The TCP connection was accepted but the WebSocket upgrade failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    #[error("send failed: {0}")]
    SendFailed(#[source] tungstenite::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] tungstenite::Error),
}
