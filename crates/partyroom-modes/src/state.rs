//! Game state types shared by every mode.
//!
//! These are the structures that get snapshotted and broadcast to clients
//! 30 times per second, so they derive serde and keep a flat shape:
//! a [`GameState`] serializes its mode-specific [`Board`] inline, with the
//! mode name under `"mode"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Rect;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies a player for the lifetime of their connection.
///
/// Serialized as a plain number so clients can compare it against the id
/// they received on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A player entering a new game: just identity, no simulation data yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrant {
    pub id: PlayerId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// The four rule sets a room can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Classic,
    Race,
    Puzzle,
    Memory,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classic => "classic",
            Self::Race => "race",
            Self::Puzzle => "puzzle",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player's simulation record inside a running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub username: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub score: u32,
    /// Classic-mode collectibles picked up.
    pub collected: u32,
}

impl PlayerState {
    /// A player at rest at `(x, y)` with no score.
    pub fn spawn(entrant: &Entrant, x: f64, y: f64) -> Self {
        Self {
            id: entrant.id,
            username: entrant.username.clone(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            score: 0,
            collected: 0,
        }
    }
}

/// A partial update to a player's kinematics sent by their client.
///
/// Absent fields leave the current value untouched. Between two ticks,
/// several patches from the same player collapse into one with
/// [`PlayerPatch::merge`]; the newest value of each field wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
}

impl PlayerPatch {
    /// Folds a newer patch on top of this one, field by field.
    pub fn merge(&mut self, newer: PlayerPatch) {
        self.x = newer.x.or(self.x);
        self.y = newer.y.or(self.y);
        self.vx = newer.vx.or(self.vx);
        self.vy = newer.vy.or(self.vy);
    }

    /// Writes the present fields onto `player`. Non-finite values are dropped.
    pub fn apply_to(&self, player: &mut PlayerState) {
        fn set(slot: &mut f64, value: Option<f64>) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *slot = v;
            }
        }
        set(&mut player.x, self.x);
        set(&mut player.y, self.y);
        set(&mut player.vx, self.vx);
        set(&mut player.vy, self.vy);
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.vx.is_none() && self.vy.is_none()
    }
}

/// A discrete player action for action-driven modes.
///
/// Classic and race ignore actions; their progress comes from movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Puzzle: move `piece` into grid `slot`.
    PlacePiece { piece: usize, slot: usize },
    /// Memory: turn `card` face up.
    FlipCard { card: usize },
}

// ---------------------------------------------------------------------------
// Board: mode-specific extension of the game state
// ---------------------------------------------------------------------------

/// A classic-mode pickup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// One tile of the puzzle grid.
///
/// `rect` is where the tile is currently drawn, i.e. the rectangle of
/// slot `current_position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PuzzlePiece {
    #[serde(flatten)]
    pub rect: Rect,
    pub correct_position: usize,
    pub current_position: usize,
    /// Set once a player has placed the piece into its correct slot.
    pub locked: bool,
}

/// One card of the memory grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryCard {
    #[serde(flatten)]
    pub rect: Rect,
    pub pair_id: usize,
    pub revealed: bool,
    pub matched: bool,
}

/// The mode-specific part of a game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Board {
    Classic {
        platforms: Vec<Rect>,
        collectibles: Vec<Collectible>,
        goal: Rect,
    },
    Race {
        checkpoints: Vec<Rect>,
        current_checkpoint: usize,
    },
    Puzzle {
        pieces: Vec<PuzzlePiece>,
        completed_count: usize,
    },
    Memory {
        cards: Vec<MemoryCard>,
        matched_pairs: usize,
    },
}

impl Board {
    pub fn mode(&self) -> GameMode {
        match self {
            Self::Classic { .. } => GameMode::Classic,
            Self::Race { .. } => GameMode::Race,
            Self::Puzzle { .. } => GameMode::Puzzle,
            Self::Memory { .. } => GameMode::Memory,
        }
    }
}

// ---------------------------------------------------------------------------
// GameState / Outcome
// ---------------------------------------------------------------------------

/// The canonical state of one running game.
///
/// Created fresh by `ModeEngine::initialize` on every start or restart and
/// never carried over between games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<PlayerState>,
    /// Milliseconds since the Unix epoch when the game was created.
    pub start_time_ms: u64,
    /// Whole seconds since the game started. Never decreases.
    pub elapsed_secs: u64,
    #[serde(flatten)]
    pub board: Board,
}

impl GameState {
    pub fn mode(&self) -> GameMode {
        self.board.mode()
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Moves the elapsed clock forward to `secs`; older readings are ignored.
    pub fn set_elapsed(&mut self, secs: u64) {
        self.elapsed_secs = self.elapsed_secs.max(secs);
    }

    /// Snapshot of the state as a finished game.
    pub fn outcome(&self, win: bool) -> Outcome {
        Outcome {
            win,
            players: self.players.clone(),
            elapsed_secs: self.elapsed_secs,
        }
    }
}

/// The terminal result of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub win: bool,
    pub players: Vec<PlayerState>,
    pub elapsed_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::spawn(
            &Entrant {
                id: PlayerId(1),
                username: "mocha".into(),
            },
            100.0,
            100.0,
        )
    }

    #[test]
    fn test_patch_merge_newest_field_wins() {
        let mut pending = PlayerPatch {
            x: Some(10.0),
            vx: Some(1.0),
            ..Default::default()
        };
        pending.merge(PlayerPatch {
            x: Some(20.0),
            vy: Some(-2.0),
            ..Default::default()
        });

        assert_eq!(pending.x, Some(20.0));
        assert_eq!(pending.vx, Some(1.0));
        assert_eq!(pending.vy, Some(-2.0));
        assert_eq!(pending.y, None);
    }

    #[test]
    fn test_patch_apply_skips_absent_and_non_finite() {
        let mut p = player();
        PlayerPatch {
            x: Some(f64::NAN),
            y: Some(300.0),
            vx: Some(f64::INFINITY),
            vy: None,
        }
        .apply_to(&mut p);

        assert_eq!(p.x, 100.0);
        assert_eq!(p.y, 300.0);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_patch_ignores_unknown_fields() {
        // Clients echo their whole player record; score must not leak in.
        let patch: PlayerPatch =
            serde_json::from_str(r#"{"x": 5.0, "score": 9999, "id": 3}"#).unwrap();
        assert_eq!(patch.x, Some(5.0));
        assert!(patch.vx.is_none());
    }

    #[test]
    fn test_set_elapsed_is_monotonic() {
        let mut state = GameState {
            players: vec![],
            start_time_ms: 0,
            elapsed_secs: 5,
            board: Board::Race {
                checkpoints: vec![],
                current_checkpoint: 0,
            },
        };
        state.set_elapsed(3);
        assert_eq!(state.elapsed_secs, 5);
        state.set_elapsed(7);
        assert_eq!(state.elapsed_secs, 7);
    }

    #[test]
    fn test_game_state_serializes_mode_inline() {
        let state = GameState {
            players: vec![player()],
            start_time_ms: 1,
            elapsed_secs: 0,
            board: Board::Race {
                checkpoints: vec![Rect::new(0.0, 0.0, 50.0, 50.0)],
                current_checkpoint: 0,
            },
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "race");
        assert_eq!(json["current_checkpoint"], 0);
        assert_eq!(json["players"][0]["username"], "mocha");
    }

    #[test]
    fn test_player_action_json_shape() {
        let action: PlayerAction =
            serde_json::from_str(r#"{"action": "flip_card", "card": 3}"#).unwrap();
        assert_eq!(action, PlayerAction::FlipCard { card: 3 });
    }
}
