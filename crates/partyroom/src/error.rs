//! Unified error type for the Partyroom server.

use partyroom_protocol::ProtocolError;
use partyroom_room::RoomError;
use partyroom_session::SessionError;
use partyroom_transport::TransportError;

/// Top-level error wrapping every sub-crate error.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors without
/// explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum PartyroomError {
    /// Socket-level failure (bind, accept, handshake, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// Server settings that cannot work together.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use partyroom_protocol::PlayerId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err: PartyroomError = TransportError::Bind(io).into();
        assert!(matches!(err, PartyroomError::Transport(_)));
        assert!(err.to_string().contains("taken"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: PartyroomError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, PartyroomError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: PartyroomError = SessionError::NotFound(PlayerId(3)).into();
        assert!(matches!(err, PartyroomError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: PartyroomError = RoomError::NotFound("ABCDE".into()).into();
        assert!(matches!(err, PartyroomError::Room(_)));
        assert!(err.to_string().contains("ABCDE"));
    }

    #[test]
    fn test_config_error_message() {
        let err = PartyroomError::Config("outbox_capacity must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: outbox_capacity must be positive"
        );
    }
}
