//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame could not be a message at all (e.g. it was empty).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
