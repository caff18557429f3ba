//! The room actor: one Tokio task per room, owning all of its state.
//!
//! Nothing outside the task ever touches a room's members or game state.
//! Callers hold a cheap, cloneable [`RoomHandle`] and send commands over a
//! channel; commands that need an answer carry a `oneshot` reply.
//!
//! While a game runs the task also owns a [`TickScheduler`], and its loop
//! races the next command against the next tick:
//!
//! ```text
//!   loop {
//!       select! {
//!           cmd  = commands.recv()  → mutate members / phase / pending input
//!           tick = ticker (if any)  → apply input, advance, check terminal, broadcast
//!       }
//!   }
//! ```
//!
//! Stopping a game drops the scheduler, so no tick can fire against a game
//! that has been discarded.

use std::collections::HashMap;
use std::future;

use partyroom_modes::{
    Entrant, GameMode, GameState, ModeEngine, PlayerAction, PlayerPatch, unix_millis,
};
use partyroom_protocol::{ChatLine, MemberInfo, PlayerId, RoomCode, RoomSnapshot, ServerMessage};
use partyroom_session::{PlayerSender, deliver};
use partyroom_tick::{TickInfo, TickScheduler};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};

use crate::{RoomConfig, RoomError, RoomPhase};

/// Reason sent with `game_ended` when a game loses too many players.
pub const NOT_ENOUGH_PLAYERS: &str = "Not enough players";

// ---------------------------------------------------------------------------
// Members and commands
// ---------------------------------------------------------------------------

/// A player as seen by a room: identity plus a way to reach them.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: PlayerId,
    pub username: String,
    pub outbox: PlayerSender,
}

impl Member {
    fn info(&self) -> MemberInfo {
        MemberInfo {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Owner-only requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    PlayAgain,
    ReturnToLobby,
}

pub(crate) enum RoomCommand {
    Join {
        member: Member,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },
    /// Replies with the number of members left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<usize>,
    },
    Control {
        player_id: PlayerId,
        control: Control,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Update {
        player_id: PlayerId,
        patch: PlayerPatch,
    },
    Action {
        player_id: PlayerId,
        action: PlayerAction,
    },
    Chat {
        player_id: PlayerId,
        content: String,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Cloneable address of a room task.
///
/// Every method fails with [`RoomError::Unavailable`] once the task has
/// stopped, which happens when the last member leaves.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn join(&self, member: Member) -> Result<RoomSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join { member, reply }).await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a member and returns how many are left. At zero the room
    /// task stops.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Leave { player_id, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn control(&self, player_id: PlayerId, control: Control) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Control {
            player_id,
            control,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    /// Queues a kinematics patch for the next tick.
    pub async fn submit_update(&self, player_id: PlayerId, patch: PlayerPatch) -> Result<(), RoomError> {
        self.send(RoomCommand::Update { player_id, patch }).await
    }

    /// Queues a discrete action for the next tick.
    pub async fn submit_action(&self, player_id: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        self.send(RoomCommand::Action { player_id, action }).await
    }

    pub async fn chat(&self, player_id: PlayerId, content: String) -> Result<(), RoomError> {
        self.send(RoomCommand::Chat { player_id, content }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

/// A game in progress. Exists only while the room is `Running`.
struct ActiveGame {
    engine: &'static dyn ModeEngine,
    state: GameState,
    ticker: TickScheduler,
    /// At most one merged patch per player between ticks.
    pending_patches: HashMap<PlayerId, PlayerPatch>,
    /// Applied in arrival order.
    pending_actions: Vec<(PlayerId, PlayerAction)>,
}

struct RoomActor {
    code: RoomCode,
    mode: GameMode,
    config: RoomConfig,
    /// Join order; index 0 is the owner.
    members: Vec<Member>,
    phase: RoomPhase,
    game: Option<ActiveGame>,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_code = %self.code, mode = %self.mode, "room actor started");

        loop {
            tokio::select! {
                // Commands first: a leave that aborts the game must win over
                // a tick that is due at the same instant.
                biased;

                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                info = next_tick(&mut self.game) => self.on_tick(info),
            }
        }

        tracing::info!(room_code = %self.code, "room actor stopped");
    }

    /// Returns `false` when the room should shut down.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { member, reply } => {
                let _ = reply.send(self.handle_join(member));
            }
            RoomCommand::Leave { player_id, reply } => {
                let remaining = self.handle_leave(player_id);
                let _ = reply.send(remaining);
                if remaining == 0 {
                    return false;
                }
            }
            RoomCommand::Control {
                player_id,
                control,
                reply,
            } => {
                let _ = reply.send(self.handle_control(player_id, control));
            }
            RoomCommand::Update { player_id, patch } => self.buffer_update(player_id, patch),
            RoomCommand::Action { player_id, action } => self.buffer_action(player_id, action),
            RoomCommand::Chat { player_id, content } => self.handle_chat(player_id, content),
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
        true
    }

    // -- Membership --

    fn handle_join(&mut self, member: Member) -> Result<RoomSnapshot, RoomError> {
        if let Some(existing) = self.members.iter_mut().find(|m| m.id == member.id) {
            existing.username = member.username;
            existing.outbox = member.outbox;
            return Ok(self.snapshot());
        }
        if self.members.len() >= self.config.max_members {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        if self.phase.is_playing() {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }

        tracing::info!(
            room_code = %self.code,
            player_id = %member.id,
            members = self.members.len() + 1,
            "player joined"
        );
        self.members.push(member);
        self.broadcast(ServerMessage::PlayerJoined {
            players: self.member_infos(),
        });
        Ok(self.snapshot())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> usize {
        let Some(index) = self.members.iter().position(|m| m.id == player_id) else {
            return self.members.len();
        };
        self.members.remove(index);
        tracing::info!(
            room_code = %self.code,
            %player_id,
            members = self.members.len(),
            "player left"
        );

        if self.members.is_empty() {
            self.stop_game();
            return 0;
        }

        if let Some(game) = &mut self.game {
            game.state.players.retain(|p| p.id != player_id);
            game.pending_patches.remove(&player_id);
            game.pending_actions.retain(|(id, _)| *id != player_id);
        }

        self.broadcast(ServerMessage::PlayerLeft {
            players: self.member_infos(),
        });

        if self.phase.is_playing() && self.members.len() < self.config.min_players {
            tracing::info!(room_code = %self.code, "game aborted: not enough players");
            self.stop_game();
            self.phase = RoomPhase::Lobby;
            self.broadcast(ServerMessage::GameEnded {
                reason: NOT_ENOUGH_PLAYERS.to_string(),
            });
        }

        self.members.len()
    }

    // -- Owner controls --

    fn handle_control(&mut self, player_id: PlayerId, control: Control) -> Result<(), RoomError> {
        match self.members.first() {
            None => return Err(RoomError::NotInRoom(player_id)),
            Some(owner) if owner.id != player_id => {
                if !self.members.iter().any(|m| m.id == player_id) {
                    return Err(RoomError::NotInRoom(player_id));
                }
                tracing::debug!(room_code = %self.code, %player_id, ?control, "ignored: not owner");
                return Err(RoomError::NotOwner(player_id));
            }
            Some(_) => {}
        }

        match (control, self.phase) {
            (Control::Start, RoomPhase::Running) => Err(RoomError::AlreadyRunning(self.code.clone())),
            (Control::Start, _) | (Control::PlayAgain, RoomPhase::Running | RoomPhase::Finished) => {
                self.start_game();
                Ok(())
            }
            (Control::ReturnToLobby, RoomPhase::Running | RoomPhase::Finished) => {
                self.stop_game();
                self.phase = RoomPhase::Lobby;
                tracing::info!(room_code = %self.code, "returned to lobby");
                self.broadcast(ServerMessage::ReturnedToLobby);
                Ok(())
            }
            (Control::PlayAgain | Control::ReturnToLobby, RoomPhase::Lobby) => {
                Err(RoomError::NotPlaying(self.code.clone()))
            }
        }
    }

    /// Builds a fresh game and its ticker in one step, replacing any game
    /// already running.
    fn start_game(&mut self) {
        let engine = self.mode.engine();
        let entrants: Vec<Entrant> = self
            .members
            .iter()
            .map(|m| Entrant {
                id: m.id,
                username: m.username.clone(),
            })
            .collect();
        let state = engine.initialize(&entrants, &mut self.rng);

        self.game = Some(ActiveGame {
            engine,
            state: state.clone(),
            ticker: TickScheduler::new(self.config.tick_config()),
            pending_patches: HashMap::new(),
            pending_actions: Vec::new(),
        });
        self.phase = RoomPhase::Running;

        tracing::info!(
            room_code = %self.code,
            mode = %self.mode,
            players = entrants.len(),
            "game started"
        );
        self.broadcast(ServerMessage::GameStarted {
            mode: self.mode,
            state,
        });
    }

    /// Drops the game and its ticker. The phase is left to the caller.
    fn stop_game(&mut self) {
        if let Some(game) = self.game.take() {
            let metrics = game.ticker.metrics();
            tracing::debug!(
                room_code = %self.code,
                phase = %self.phase,
                ticks = game.ticker.tick_count(),
                overruns = metrics.total_overruns,
                skipped = metrics.total_skipped,
                avg_tick_us = metrics.avg_tick_time.as_micros() as u64,
                max_tick_us = metrics.max_tick_time.as_micros() as u64,
                last_budget = metrics.budget_utilization,
                "game loop stopped"
            );
        }
    }

    // -- Player input --

    fn buffer_update(&mut self, player_id: PlayerId, patch: PlayerPatch) {
        let Some(game) = &mut self.game else { return };
        if patch.is_empty() || game.state.player(player_id).is_none() {
            return;
        }
        game.pending_patches.entry(player_id).or_default().merge(patch);
    }

    fn buffer_action(&mut self, player_id: PlayerId, action: PlayerAction) {
        let Some(game) = &mut self.game else { return };
        if game.state.player(player_id).is_none() {
            return;
        }
        game.pending_actions.push((player_id, action));
    }

    fn handle_chat(&self, player_id: PlayerId, content: String) {
        let Some(sender) = self.members.iter().find(|m| m.id == player_id) else {
            return;
        };
        let line = ChatLine {
            sender: sender.username.clone(),
            content,
            timestamp: unix_millis(),
        };
        self.broadcast(ServerMessage::ChatMessage(line));
    }

    // -- Tick --

    fn on_tick(&mut self, info: TickInfo) {
        // Checked before any mutation: a stopped game is never advanced.
        if self.phase != RoomPhase::Running {
            return;
        }
        let Some(game) = &mut self.game else { return };

        game.state.set_elapsed(info.elapsed.as_secs());

        for (player_id, patch) in game.pending_patches.drain() {
            if let Some(player) = game.state.player_mut(player_id) {
                patch.apply_to(player);
            }
        }
        for (player_id, action) in game.pending_actions.drain(..) {
            game.engine.apply_action(&mut game.state, player_id, action);
        }

        game.engine.advance(&mut game.state, info.dt);
        let outcome = game.engine.is_terminal(&game.state);
        game.ticker.record_tick_end();

        match outcome {
            Some(outcome) => {
                tracing::info!(
                    room_code = %self.code,
                    win = outcome.win,
                    elapsed_secs = outcome.elapsed_secs,
                    "game over"
                );
                self.stop_game();
                self.phase = RoomPhase::Finished;
                self.broadcast(ServerMessage::GameOver(outcome));
            }
            None => {
                let msg = ServerMessage::GameStateUpdate(game.state.clone());
                self.broadcast(msg);
            }
        }
    }

    // -- Helpers --

    fn broadcast(&self, msg: ServerMessage) {
        for member in &self.members {
            deliver(member.id, &member.outbox, msg.clone());
        }
    }

    fn member_infos(&self) -> Vec<MemberInfo> {
        self.members.iter().map(Member::info).collect()
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_code: self.code.clone(),
            mode: self.mode,
            players: self.member_infos(),
            is_playing: self.phase.is_playing(),
        }
    }
}

/// Resolves on the active game's next tick; pends forever without one.
async fn next_tick(game: &mut Option<ActiveGame>) -> TickInfo {
    match game {
        Some(game) => game.ticker.wait_for_tick().await,
        None => future::pending().await,
    }
}

/// Spawns a room task with `owner` as its only member.
pub(crate) fn spawn_room(
    code: RoomCode,
    mode: GameMode,
    config: RoomConfig,
    owner: Member,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let actor = RoomActor {
        code: code.clone(),
        mode,
        config,
        members: vec![owner],
        phase: RoomPhase::Lobby,
        game: None,
        rng,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
