//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use partyroom::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = PartyroomServerBuilder::new()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            rng_seed: Some(7),
            ..RoomConfig::default()
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// A connected client and the id the server assigned it.
struct Client {
    ws: ClientWs,
    id: PlayerId,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        let mut client = Self {
            ws,
            id: PlayerId(0),
        };
        match client.recv().await {
            ServerMessage::Connected { player_id } => client.id = player_id,
            other => panic!("expected connected, got {other:?}"),
        }
        client
    }

    async fn send(&mut self, frame: Value) {
        self.ws
            .send(Message::text(frame.to_string()))
            .await
            .expect("send");
    }

    async fn recv(&mut self) -> ServerMessage {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream ended")
                .expect("websocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("decode server message");
            }
        }
    }

    /// Skips frames until one with the given event name arrives.
    async fn recv_event(&mut self, event: &str) -> ServerMessage {
        loop {
            let msg = self.recv().await;
            if msg.event() == event {
                return msg;
            }
        }
    }

    async fn create_room(&mut self, username: &str, mode: &str) -> RoomCode {
        self.send(json!({
            "event": "create_room",
            "data": {"username": username, "mode": mode}
        }))
        .await;
        match self.recv_event("room_created").await {
            ServerMessage::RoomCreated { room_code } => room_code,
            _ => unreachable!(),
        }
    }

    async fn join_room(&mut self, username: &str, code: &str) {
        self.send(json!({
            "event": "join_room",
            "data": {"username": username, "room_code": code}
        }))
        .await;
    }
}

// =========================================================================
// Connection
// =========================================================================

#[tokio::test]
async fn test_connect_assigns_distinct_ids() {
    let addr = start_server().await;
    let a = Client::connect(&addr).await;
    let b = Client::connect(&addr).await;
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_invalid_frame_gets_error_and_connection_survives() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.ws.send(Message::text("not json")).await.unwrap();
    assert!(matches!(client.recv().await, ServerMessage::Error { .. }));

    client.send(json!({"event": "no_such_event"})).await;
    assert!(matches!(client.recv().await, ServerMessage::Error { .. }));

    let code = client.create_room("ana", "classic").await;
    assert!(RoomCode::is_well_formed(code.as_str()));
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_join_flow_notifies_everyone() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "race").await;
    guest.join_room("bo", &code.as_str().to_lowercase()).await;

    let ServerMessage::RoomJoined(snapshot) = guest.recv_event("room_joined").await else {
        unreachable!()
    };
    assert_eq!(snapshot.room_code, code);
    assert_eq!(snapshot.mode, GameMode::Race);
    assert_eq!(snapshot.owner(), Some(owner.id));
    assert!(!snapshot.is_playing);

    let ServerMessage::PlayerJoined { players } = owner.recv_event("player_joined").await else {
        unreachable!()
    };
    let names: Vec<_> = players.iter().map(|p| p.username.as_str()).collect();
    assert_eq!(names, ["ana", "bo"]);
}

#[tokio::test]
async fn test_join_unknown_room_reports_to_requester() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.join_room("bo", "ZZZZZ").await;

    assert_eq!(
        client.recv().await,
        ServerMessage::RoomError {
            kind: RoomErrorKind::RoomNotFound,
            message: "Room not found".into(),
        }
    );
}

#[tokio::test]
async fn test_join_playing_room_reports_game_in_progress() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut late = Client::connect(&addr).await;

    let code = owner.create_room("ana", "memory").await;
    owner.send(json!({"event": "start_game"})).await;
    owner.recv_event("game_started").await;

    late.join_room("cy", code.as_str()).await;
    let ServerMessage::RoomError { kind, .. } = late.recv_event("room_error").await else {
        unreachable!()
    };
    assert_eq!(kind, RoomErrorKind::GameInProgress);
}

// =========================================================================
// Games
// =========================================================================

#[tokio::test]
async fn test_non_owner_start_is_ignored() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "classic").await;
    guest.join_room("bo", code.as_str()).await;
    guest.recv_event("room_joined").await;

    guest.send(json!({"event": "start_game"})).await;
    // Frames are handled in order, so the chat line arrives before any
    // game_started could.
    guest
        .send(json!({"event": "chat_message", "data": {"content": "ready?"}}))
        .await;

    let ServerMessage::ChatMessage(line) = guest.recv().await else {
        panic!("expected the chat line first");
    };
    assert_eq!(line.sender, "bo");
    assert_eq!(line.content, "ready?");
}

#[tokio::test]
async fn test_non_owner_reset_and_lobby_are_ignored_mid_game() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "race").await;
    guest.join_room("bo", code.as_str()).await;
    guest.recv_event("room_joined").await;
    owner.send(json!({"event": "start_game"})).await;
    guest.recv_event("game_started").await;

    for _ in 0..2 {
        guest.send(json!({"event": "play_again"})).await;
        guest.send(json!({"event": "return_to_lobby"})).await;
    }
    guest
        .send(json!({"event": "chat_message", "data": {"content": "again?"}}))
        .await;

    // Everything the guest sent is handled before the chat line, so it
    // must be the first room-level event after the game started.
    loop {
        match guest.recv().await {
            ServerMessage::GameStateUpdate(_) => continue,
            ServerMessage::ChatMessage(line) => {
                assert_eq!(line.content, "again?");
                break;
            }
            other => panic!("guest control had an effect: {other:?}"),
        }
    }

    // Still mid-game: a late joiner is refused.
    let mut late = Client::connect(&addr).await;
    late.join_room("cy", code.as_str()).await;
    let ServerMessage::RoomError { kind, .. } = late.recv_event("room_error").await else {
        unreachable!()
    };
    assert_eq!(kind, RoomErrorKind::GameInProgress);
}

#[tokio::test]
async fn test_start_streams_state_to_all_members() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "classic").await;
    guest.join_room("bo", code.as_str()).await;
    guest.recv_event("room_joined").await;
    owner.send(json!({"event": "start_game"})).await;

    for client in [&mut owner, &mut guest] {
        let ServerMessage::GameStarted { mode, state } = client.recv_event("game_started").await
        else {
            unreachable!()
        };
        assert_eq!(mode, GameMode::Classic);
        assert_eq!(state.players.len(), 2);
        assert!(matches!(
            client.recv().await,
            ServerMessage::GameStateUpdate(_)
        ));
    }
}

#[tokio::test]
async fn test_player_update_moves_player() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "memory").await;
    guest.join_room("bo", code.as_str()).await;
    guest.recv_event("room_joined").await;
    owner.send(json!({"event": "start_game"})).await;
    owner.recv_event("game_started").await;

    owner
        .send(json!({
            "event": "player_update",
            "data": {"x": 123.0, "y": 456.0, "vx": 0.0, "vy": 0.0, "score": 9999}
        }))
        .await;

    loop {
        let ServerMessage::GameStateUpdate(state) = owner.recv_event("game_state_update").await
        else {
            unreachable!()
        };
        let me = state.player(owner.id).expect("owner in state");
        if (me.x, me.y) == (123.0, 456.0) {
            assert_eq!(me.score, 0);
            break;
        }
    }
}

#[tokio::test]
async fn test_disconnect_mid_game_aborts_it() {
    let addr = start_server().await;
    let mut owner = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let code = owner.create_room("ana", "race").await;
    guest.join_room("bo", code.as_str()).await;
    guest.recv_event("room_joined").await;
    owner.send(json!({"event": "start_game"})).await;
    owner.recv_event("game_started").await;

    guest.ws.close(None).await.unwrap();
    drop(guest);

    let ServerMessage::PlayerLeft { players } = owner.recv_event("player_left").await else {
        unreachable!()
    };
    assert_eq!(players.len(), 1);
    assert_eq!(
        owner.recv_event("game_ended").await,
        ServerMessage::GameEnded {
            reason: "Not enough players".into()
        }
    );
}

// =========================================================================
// Relays
// =========================================================================

#[tokio::test]
async fn test_webrtc_offer_relayed_with_sender() {
    let addr = start_server().await;
    let mut a = Client::connect(&addr).await;
    let mut b = Client::connect(&addr).await;

    a.send(json!({
        "event": "webrtc_offer",
        "data": {"to": b.id.0, "offer": {"type": "offer", "sdp": "v=0"}}
    }))
    .await;

    assert_eq!(
        b.recv().await,
        ServerMessage::WebrtcOffer {
            from: a.id,
            offer: json!({"type": "offer", "sdp": "v=0"}),
        }
    );
}

#[tokio::test]
async fn test_chat_outside_room_is_ignored() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .send(json!({"event": "chat_message", "data": {"content": "hello?"}}))
        .await;
    let code = client.create_room("ana", "puzzle").await;
    assert!(RoomCode::is_well_formed(code.as_str()));
}
