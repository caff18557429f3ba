//! The `ModeEngine` trait: the contract every game mode implements.
//!
//! The room's session loop only ever talks to a `&dyn ModeEngine`, so a
//! new mode is one new implementation plus one arm in
//! [`GameMode::engine`](crate::GameMode::engine); the loop itself never
//! changes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore};

use crate::{
    ARENA_MAX, ARENA_MIN, Board, Entrant, GameMode, GameState, Outcome,
    PlayerAction, PlayerId, PlayerState, SPAWN_MAX, SPAWN_MIN,
};

/// Rules for one game mode.
///
/// Implementations are stateless: everything lives in the [`GameState`]
/// they are handed. `Send + Sync + 'static` so a `&'static dyn ModeEngine`
/// can be held by room tasks on any worker thread.
pub trait ModeEngine: Send + Sync + 'static {
    /// Which mode this engine implements.
    fn mode(&self) -> GameMode;

    /// Builds the mode-specific board for `player_count` players.
    fn build_board(&self, player_count: usize, rng: &mut dyn RngCore) -> Board;

    /// Creates a fresh game: every entrant spawns at a random point in
    /// the spawn square, at rest, with no score.
    fn initialize(&self, entrants: &[Entrant], rng: &mut dyn RngCore) -> GameState {
        let players = entrants
            .iter()
            .map(|e| {
                let x = rng.random_range(SPAWN_MIN..=SPAWN_MAX);
                let y = rng.random_range(SPAWN_MIN..=SPAWN_MAX);
                PlayerState::spawn(e, x, y)
            })
            .collect();

        GameState {
            players,
            start_time_ms: unix_millis(),
            elapsed_secs: 0,
            board: self.build_board(entrants.len(), rng),
        }
    }

    /// Runs one simulation step.
    ///
    /// Velocities are in arena units per tick, so `dt` is informational
    /// for the built-in modes.
    fn advance(&self, state: &mut GameState, dt: Duration);

    /// Returns the outcome if the game is over.
    fn is_terminal(&self, state: &GameState) -> Option<Outcome>;

    /// Applies a discrete player action. Returns `true` if it changed
    /// the state. Default: actions are ignored.
    fn apply_action(
        &self,
        _state: &mut GameState,
        _player: PlayerId,
        _action: PlayerAction,
    ) -> bool {
        false
    }
}

/// Moves every player by its velocity and clamps them into the arena.
///
/// Velocity itself is never clamped; a client may ask for any speed, but
/// the resulting position always lands inside `[ARENA_MIN, ARENA_MAX]`.
pub fn integrate(players: &mut [PlayerState]) {
    for p in players {
        p.x = (p.x + p.vx).clamp(ARENA_MIN, ARENA_MAX);
        p.y = (p.y + p.vy).clamp(ARENA_MIN, ARENA_MAX);
        // NaN survives `clamp`; park the player on the edge instead.
        if !p.x.is_finite() {
            p.x = ARENA_MIN;
        }
        if !p.y.is_finite() {
            p.y = ARENA_MIN;
        }
    }
}

/// Milliseconds since the Unix epoch; 0 if the system clock is before it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
