//! `PartyroomServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.

use std::net::SocketAddr;
use std::sync::Arc;

use partyroom_protocol::JsonCodec;
use partyroom_room::{RoomConfig, RoomRegistry};
use partyroom_transport::{Connection, WebSocketListener};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{PartyroomError, ServerConfig};

/// State shared by every connection task.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
    pub(crate) outbox_capacity: usize,
}

/// Builder for configuring and starting a Partyroom server.
///
/// # Example
///
/// ```rust,ignore
/// use partyroom::prelude::*;
///
/// let server = PartyroomServer::builder()
///     .bind("0.0.0.0:3000")
///     .tick_rate(30)
///     .build()
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartyroomServerBuilder {
    config: ServerConfig,
}

impl PartyroomServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from the
    /// environment.
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.config.outbox_capacity = capacity;
        self
    }

    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.room.tick_rate = hz;
        self
    }

    pub fn max_members(mut self, max: usize) -> Self {
        self.config.room.max_members = max;
        self
    }

    /// Validates the configuration and binds the listener.
    pub async fn build(self) -> Result<PartyroomServer, PartyroomError> {
        self.config.validate()?;
        let listener = WebSocketListener::bind(self.config.bind.as_str()).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.config.room.clone())),
            codec: JsonCodec,
            outbox_capacity: self.config.outbox_capacity,
        });

        Ok(PartyroomServer { listener, state })
    }
}

/// A bound Partyroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PartyroomServer {
    listener: WebSocketListener,
    state: Arc<ServerState>,
}

impl PartyroomServer {
    pub fn builder() -> PartyroomServerBuilder {
        PartyroomServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr, PartyroomError> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each TCP connection is upgraded and served on its own task, so a
    /// slow handshake never holds up the next accept.
    pub async fn run(self) -> Result<(), PartyroomError> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "partyroom server running");

        loop {
            let pending = match self.listener.accept().await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let peer = pending.peer_addr();
                let conn = match pending.upgrade().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::debug!(%peer, error = %e, "websocket upgrade failed");
                        return;
                    }
                };
                let conn_id = conn.id();
                if let Err(e) = handle_connection(conn, state).await {
                    tracing::debug!(%conn_id, error = %e, "connection ended with error");
                }
            });
        }
    }
}
