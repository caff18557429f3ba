//! Room configuration and lifecycle phases.

use std::fmt;
use std::time::Duration;

use partyroom_tick::{OverrunPolicy, TickConfig};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Joins beyond this many members are refused.
    pub max_members: usize,

    /// A running game with fewer members than this is aborted.
    pub min_players: usize,

    /// Game loop rate in ticks per second.
    pub tick_rate: u32,

    /// Random delay before a game's first tick, so rooms started together
    /// spread their ticks out.
    pub tick_jitter: Duration,

    /// How a game loop catches up after a late tick.
    #[serde(skip)]
    pub overrun_policy: OverrunPolicy,

    /// Capacity of each room's command channel.
    pub command_buffer: usize,

    /// Seeds every room's RNG (room codes, spawn points, boards). `None`
    /// seeds from the OS. Fixed seeds are for tests.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_members: 10,
            min_players: 2,
            tick_rate: TickConfig::DEFAULT_TICK_RATE_HZ,
            tick_jitter: Duration::from_millis(1),
            overrun_policy: OverrunPolicy::Skip,
            command_buffer: 64,
            rng_seed: None,
        }
    }
}

impl RoomConfig {
    pub(crate) fn tick_config(&self) -> TickConfig {
        TickConfig {
            initial_jitter_us: self.tick_jitter.as_micros() as u64,
            policy: self.overrun_policy,
            ..TickConfig::with_rate(self.tick_rate)
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its game lifecycle.
///
/// ```text
///   Lobby ──start──→ Running ──terminal──→ Finished
///     ▲                 │  ▲                  │
///     │                 │  └───play_again─────┤
///     └──return_to_lobby / too few players────┘
/// ```
///
/// A room counts as "playing" in both `Running` and `Finished`: the
/// results screen is still part of the game, so nobody can join until the
/// owner returns everyone to the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Lobby,
    Running,
    Finished,
}

impl RoomPhase {
    pub fn is_playing(self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
