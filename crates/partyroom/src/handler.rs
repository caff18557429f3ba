//! Per-connection handler: identity, outbound writer, and message routing.
//!
//! Each upgraded connection gets its own task running this handler:
//!   1. Register the player and send `connected`
//!   2. Spawn a writer task that drains the player's outbox to the socket
//!   3. Loop: decode client frames → dispatch to the room registry
//!   4. On close, the guard disconnects the player (implicit leave)

use std::sync::Arc;

use partyroom_protocol::{ClientMessage, Codec, PlayerId, ServerMessage};
use partyroom_room::{RoomError, RoomHandle};
use partyroom_session::{PlayerSender, deliver};
use partyroom_transport::{Connection, FrameReader, FrameWriter};
use tokio::sync::mpsc;

use crate::PartyroomError;
use crate::server::ServerState;

/// Disconnects the player when the handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs on a spawned task.
struct ConnectionGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.disconnect(player_id).await;
            tracing::info!(%player_id, "player disconnected");
        });
    }
}

/// Handles a single connection from upgrade to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    state: Arc<ServerState>,
) -> Result<(), PartyroomError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    let (mut reader, writer) = conn.split();

    let (outbox, inbox) = mpsc::channel(state.outbox_capacity);
    let player_id = state.registry.lock().await.connect(outbox.clone());
    let _guard = ConnectionGuard {
        player_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, %player_id, %peer, "player connected");

    tokio::spawn(write_loop(writer, inbox, state.codec, player_id));
    deliver(player_id, &outbox, ServerMessage::Connected { player_id });

    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%player_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "receive failed");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable frame");
                deliver(
                    player_id,
                    &outbox,
                    ServerMessage::Error {
                        message: format!("invalid message: {e}"),
                    },
                );
                continue;
            }
        };

        dispatch(&state, player_id, &outbox, msg).await;
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Encodes outbox messages and writes them to the socket until every
/// sender is gone or the socket fails.
async fn write_loop<W: FrameWriter, C: Codec>(
    mut writer: W,
    mut inbox: mpsc::Receiver<ServerMessage>,
    codec: C,
    player_id: PlayerId,
) {
    while let Some(msg) = inbox.recv().await {
        let text = match codec.encode(&msg) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%player_id, event = msg.event(), error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = writer.send_text(text).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            return;
        }
    }
    let _ = writer.close().await;
}

/// Routes one client message.
///
/// Failures never end the connection. Join-time errors go back to the
/// requester as `room_error`; everything else, including non-owner
/// controls, is logged and dropped.
async fn dispatch(
    state: &ServerState,
    player_id: PlayerId,
    outbox: &PlayerSender,
    msg: ClientMessage,
) {
    let event = msg.event();
    tracing::trace!(%player_id, event, "client message");

    let result = match msg {
        ClientMessage::CreateRoom { username, mode } => state
            .registry
            .lock()
            .await
            .create_room(player_id, &username, mode)
            .await
            .map(drop),

        ClientMessage::JoinRoom {
            username,
            room_code,
        } => state
            .registry
            .lock()
            .await
            .join_room(player_id, &username, &room_code)
            .await
            .map(drop),

        ClientMessage::LeaveRoom => {
            state.registry.lock().await.leave_room(player_id).await;
            Ok(())
        }

        ClientMessage::StartGame => state.registry.lock().await.start_game(player_id).await,
        ClientMessage::PlayAgain => state.registry.lock().await.play_again(player_id).await,
        ClientMessage::ReturnToLobby => {
            state.registry.lock().await.return_to_lobby(player_id).await
        }

        // High-frequency input: the registry lock is released before the
        // room is awaited.
        ClientMessage::PlayerUpdate(patch) => match current_room(state, player_id).await {
            Ok(room) => room.submit_update(player_id, patch).await,
            Err(e) => Err(e),
        },
        ClientMessage::PlayerAction(action) => match current_room(state, player_id).await {
            Ok(room) => room.submit_action(player_id, action).await,
            Err(e) => Err(e),
        },
        ClientMessage::ChatMessage { content } => match current_room(state, player_id).await {
            Ok(room) => room.chat(player_id, content).await,
            Err(e) => Err(e),
        },

        ClientMessage::WebrtcOffer { to, offer } => {
            relay(state, to, ServerMessage::WebrtcOffer { from: player_id, offer }).await;
            Ok(())
        }
        ClientMessage::WebrtcAnswer { to, answer } => {
            relay(state, to, ServerMessage::WebrtcAnswer { from: player_id, answer }).await;
            Ok(())
        }
        ClientMessage::WebrtcIceCandidate { to, candidate } => {
            relay(
                state,
                to,
                ServerMessage::WebrtcIceCandidate {
                    from: player_id,
                    candidate,
                },
            )
            .await;
            Ok(())
        }
    };

    if let Err(e) = result {
        report(player_id, outbox, event, e);
    }
}

async fn current_room(state: &ServerState, player_id: PlayerId) -> Result<RoomHandle, RoomError> {
    state
        .registry
        .lock()
        .await
        .room_handle_for(player_id)
        .ok_or(RoomError::NotInRoom(player_id))
}

async fn relay(state: &ServerState, to: PlayerId, msg: ServerMessage) {
    if !state.registry.lock().await.relay_signal(to, msg) {
        tracing::debug!(%to, "signaling target not connected");
    }
}

fn report(player_id: PlayerId, outbox: &PlayerSender, event: &str, err: RoomError) {
    match err.kind() {
        Some(kind) => {
            tracing::debug!(%player_id, event, error = %err, "request rejected");
            deliver(
                player_id,
                outbox,
                ServerMessage::RoomError {
                    kind,
                    message: err.client_message().to_string(),
                },
            );
        }
        None => tracing::debug!(%player_id, event, error = %err, "request ignored"),
    }
}
