//! Mini-game rule sets for Partyroom.
//!
//! Every mode implements the same [`ModeEngine`] contract:
//!
//! - `initialize`: build a fresh [`GameState`] for the given roster
//! - `advance`: run one simulation step (movement, then mode rules)
//! - `is_terminal`: decide whether the game is over and produce an [`Outcome`]
//!
//! plus an optional `apply_action` for modes whose progress is driven by
//! explicit player actions (puzzle pieces, memory cards).
//!
//! Engines are stateless unit structs. All game data lives in the
//! [`GameState`] handed to them, which is owned by exactly one room task.
//!
//! ```text
//! GameMode::engine() ──→ &dyn ModeEngine ──→ ClassicMode | RaceMode | PuzzleMode | MemoryMode
//! ```

mod classic;
mod engine;
mod geometry;
mod memory;
mod puzzle;
mod race;
mod state;

pub use classic::ClassicMode;
pub use engine::{ModeEngine, integrate, unix_millis};
pub use geometry::{ARENA_MAX, ARENA_MIN, Rect, SPAWN_MAX, SPAWN_MIN};
pub use memory::MemoryMode;
pub use puzzle::PuzzleMode;
pub use race::RaceMode;
pub use state::{
    Board, Collectible, Entrant, GameMode, GameState, MemoryCard, Outcome,
    PlayerAction, PlayerId, PlayerPatch, PlayerState, PuzzlePiece,
};

impl GameMode {
    /// Returns the rule set for this mode.
    pub fn engine(self) -> &'static dyn ModeEngine {
        match self {
            Self::Classic => &ClassicMode,
            Self::Race => &RaceMode,
            Self::Puzzle => &PuzzleMode,
            Self::Memory => &MemoryMode,
        }
    }
}
