//! Inbound and outbound events.
//!
//! Both enums are adjacently tagged:
//!
//! ```text
//! ClientMessage::JoinRoom { username, room_code }
//!   → {"event":"join_room","data":{"username":"ana","room_code":"K7MPX"}}
//!
//! ClientMessage::StartGame
//!   → {"event":"start_game"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use partyroom_modes::{GameMode, GameState, Outcome, PlayerAction, PlayerId, PlayerPatch};

use crate::{MemberInfo, RoomCode, RoomErrorKind, RoomSnapshot};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        username: String,
        mode: GameMode,
    },

    /// `room_code` stays a raw string here; the server normalizes it.
    JoinRoom {
        #[serde(default)]
        username: String,
        room_code: String,
    },

    LeaveRoom,

    /// Owner only.
    StartGame,

    /// Partial kinematics for the sender's own player.
    PlayerUpdate(PlayerPatch),

    /// A discrete puzzle/memory move.
    PlayerAction(PlayerAction),

    /// Owner only.
    PlayAgain,

    /// Owner only.
    ReturnToLobby,

    ChatMessage {
        content: String,
    },

    // -- WebRTC signaling, relayed untouched to `to` --
    WebrtcOffer {
        to: PlayerId,
        offer: Value,
    },

    WebrtcAnswer {
        to: PlayerId,
        answer: Value,
    },

    WebrtcIceCandidate {
        to: PlayerId,
        candidate: Value,
    },
}

impl ClientMessage {
    /// The event name, for logs.
    pub fn event(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::StartGame => "start_game",
            Self::PlayerUpdate(_) => "player_update",
            Self::PlayerAction(_) => "player_action",
            Self::PlayAgain => "play_again",
            Self::ReturnToLobby => "return_to_lobby",
            Self::ChatMessage { .. } => "chat_message",
            Self::WebrtcOffer { .. } => "webrtc_offer",
            Self::WebrtcAnswer { .. } => "webrtc_answer",
            Self::WebrtcIceCandidate { .. } => "webrtc_ice_candidate",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// A relayed chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// The sender's username at the time of sending.
    pub sender: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every connection.
    Connected { player_id: PlayerId },

    /// To the creator only.
    RoomCreated { room_code: RoomCode },

    /// To the joiner only.
    RoomJoined(RoomSnapshot),

    /// A refused create/join, to the requester only.
    RoomError { kind: RoomErrorKind, message: String },

    PlayerJoined { players: Vec<MemberInfo> },

    PlayerLeft { players: Vec<MemberInfo> },

    GameStarted { mode: GameMode, state: GameState },

    /// Full state, once per tick while a game runs.
    GameStateUpdate(GameState),

    GameOver(Outcome),

    /// The game was aborted, e.g. too few players remained.
    GameEnded { reason: String },

    ReturnedToLobby,

    ChatMessage(ChatLine),

    WebrtcOffer { from: PlayerId, offer: Value },

    WebrtcAnswer { from: PlayerId, answer: Value },

    WebrtcIceCandidate { from: PlayerId, candidate: Value },

    /// A frame the server could not understand.
    Error { message: String },
}

impl ServerMessage {
    /// The event name, for logs.
    pub fn event(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined(_) => "room_joined",
            Self::RoomError { .. } => "room_error",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::GameStarted { .. } => "game_started",
            Self::GameStateUpdate(_) => "game_state_update",
            Self::GameOver(_) => "game_over",
            Self::GameEnded { .. } => "game_ended",
            Self::ReturnedToLobby => "returned_to_lobby",
            Self::ChatMessage(_) => "chat_message",
            Self::WebrtcOffer { .. } => "webrtc_offer",
            Self::WebrtcAnswer { .. } => "webrtc_answer",
            Self::WebrtcIceCandidate { .. } => "webrtc_ice_candidate",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> ClientMessage {
        serde_json::from_value(value).unwrap()
    }

    // =====================================================================
    // ClientMessage: JSON shapes clients actually send
    // =====================================================================

    #[test]
    fn test_create_room_json() {
        let msg = decode(json!({
            "event": "create_room",
            "data": {"username": "ana", "mode": "race"}
        }));
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                username: "ana".into(),
                mode: GameMode::Race,
            }
        );
    }

    #[test]
    fn test_create_room_rejects_unknown_mode() {
        let result: Result<ClientMessage, _> = serde_json::from_value(json!({
            "event": "create_room",
            "data": {"username": "ana", "mode": "chess"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_join_room_username_optional() {
        let msg = decode(json!({
            "event": "join_room",
            "data": {"room_code": "abcde"}
        }));
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                username: String::new(),
                room_code: "abcde".into(),
            }
        );
    }

    #[test]
    fn test_unit_events_without_data() {
        assert_eq!(decode(json!({"event": "start_game"})), ClientMessage::StartGame);
        assert_eq!(decode(json!({"event": "play_again"})), ClientMessage::PlayAgain);
        assert_eq!(
            decode(json!({"event": "return_to_lobby"})),
            ClientMessage::ReturnToLobby
        );
    }

    #[test]
    fn test_player_update_partial_fields() {
        let msg = decode(json!({
            "event": "player_update",
            "data": {"vx": 3.5, "score": 10000}
        }));
        let ClientMessage::PlayerUpdate(patch) = msg else {
            panic!("expected player_update, got {msg:?}");
        };
        assert_eq!(patch.vx, Some(3.5));
        assert!(patch.x.is_none() && patch.y.is_none() && patch.vy.is_none());
    }

    #[test]
    fn test_player_action_json() {
        let msg = decode(json!({
            "event": "player_action",
            "data": {"action": "place_piece", "piece": 2, "slot": 7}
        }));
        assert_eq!(
            msg,
            ClientMessage::PlayerAction(PlayerAction::PlacePiece { piece: 2, slot: 7 })
        );
    }

    #[test]
    fn test_webrtc_offer_keeps_payload_opaque() {
        let msg = decode(json!({
            "event": "webrtc_offer",
            "data": {"to": 5, "offer": {"type": "offer", "sdp": "v=0"}}
        }));
        let ClientMessage::WebrtcOffer { to, offer } = msg else {
            panic!("expected webrtc_offer");
        };
        assert_eq!(to, PlayerId(5));
        assert_eq!(offer["sdp"], "v=0");
    }

    // =====================================================================
    // ServerMessage
    // =====================================================================

    #[test]
    fn test_room_created_json() {
        let code = RoomCode::parse("QWERT").unwrap();
        let json = serde_json::to_value(ServerMessage::RoomCreated { room_code: code }).unwrap();
        assert_eq!(json, json!({"event": "room_created", "data": {"room_code": "QWERT"}}));
    }

    #[test]
    fn test_returned_to_lobby_has_no_data() {
        let json = serde_json::to_value(ServerMessage::ReturnedToLobby).unwrap();
        assert_eq!(json, json!({"event": "returned_to_lobby"}));
    }

    #[test]
    fn test_room_error_json() {
        let json = serde_json::to_value(ServerMessage::RoomError {
            kind: RoomErrorKind::RoomFull,
            message: "Room is full".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "room_error");
        assert_eq!(json["data"]["kind"], "room_full");
    }

    #[test]
    fn test_chat_message_json() {
        let json = serde_json::to_value(ServerMessage::ChatMessage(ChatLine {
            sender: "ana".into(),
            content: "gg".into(),
            timestamp: 1_700_000_000_000,
        }))
        .unwrap();
        assert_eq!(json["data"]["sender"], "ana");
        assert_eq!(json["data"]["timestamp"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_event_names_match_serialized_tag() {
        let messages = [
            ServerMessage::Connected {
                player_id: PlayerId(1),
            },
            ServerMessage::GameEnded {
                reason: "Not enough players".into(),
            },
            ServerMessage::PlayerLeft { players: vec![] },
            ServerMessage::Error {
                message: "bad".into(),
            },
        ];
        for msg in messages {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["event"], msg.event());
        }
    }
}
