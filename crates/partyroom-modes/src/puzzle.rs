//! Puzzle mode: put a scrambled 3×3 picture back together as a team.

use std::time::Duration;

use rand::RngCore;
use rand::seq::SliceRandom;

use crate::{
    Board, GameMode, GameState, ModeEngine, Outcome, PlayerAction, PlayerId,
    PuzzlePiece, Rect, integrate,
};

pub const GRID_SIDE: usize = 3;
pub const PIECE_COUNT: usize = GRID_SIDE * GRID_SIDE;
pub const PIECE_SIZE: f64 = 150.0;

/// Score for locking a piece into its correct slot.
pub const PLACE_SCORE: u32 = 10;

const GRID_ORIGIN: f64 = 150.0;
const GRID_STRIDE: f64 = 200.0;

/// Rectangle of grid slot `slot` (row-major).
pub fn slot_rect(slot: usize) -> Rect {
    Rect::new(
        GRID_ORIGIN + (slot % GRID_SIDE) as f64 * GRID_STRIDE,
        GRID_ORIGIN + (slot / GRID_SIDE) as f64 * GRID_STRIDE,
        PIECE_SIZE,
        PIECE_SIZE,
    )
}

/// Puzzle rules.
///
/// Pieces start shuffled across the fixed grid. A
/// [`PlayerAction::PlacePiece`] moves an unlocked piece into a slot,
/// swapping with the unlocked piece already there. When a placed piece
/// lands on its correct slot it locks, counts towards
/// `completed_count`, and pays [`PLACE_SCORE`] to the placing player.
#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleMode;

impl ModeEngine for PuzzleMode {
    fn mode(&self) -> GameMode {
        GameMode::Puzzle
    }

    fn build_board(&self, _player_count: usize, rng: &mut dyn RngCore) -> Board {
        let mut slots: Vec<usize> = (0..PIECE_COUNT).collect();
        slots.shuffle(rng);

        let pieces = slots
            .into_iter()
            .enumerate()
            .map(|(correct, current)| PuzzlePiece {
                rect: slot_rect(current),
                correct_position: correct,
                current_position: current,
                locked: false,
            })
            .collect();

        Board::Puzzle {
            pieces,
            completed_count: 0,
        }
    }

    fn advance(&self, state: &mut GameState, _dt: Duration) {
        integrate(&mut state.players);
    }

    fn is_terminal(&self, state: &GameState) -> Option<Outcome> {
        match &state.board {
            Board::Puzzle {
                pieces,
                completed_count,
            } if *completed_count >= pieces.len() => Some(state.outcome(true)),
            _ => None,
        }
    }

    fn apply_action(
        &self,
        state: &mut GameState,
        player: PlayerId,
        action: PlayerAction,
    ) -> bool {
        let PlayerAction::PlacePiece { piece, slot } = action else {
            return false;
        };
        let Board::Puzzle {
            pieces,
            completed_count,
        } = &mut state.board
        else {
            return false;
        };
        if piece >= pieces.len() || slot >= pieces.len() || pieces[piece].locked {
            return false;
        }

        let from = pieces[piece].current_position;
        if from != slot {
            let Some(occupant) = pieces.iter().position(|p| p.current_position == slot)
            else {
                return false;
            };
            if pieces[occupant].locked {
                return false;
            }
            pieces[occupant].current_position = from;
            pieces[occupant].rect = slot_rect(from);
            pieces[piece].current_position = slot;
            pieces[piece].rect = slot_rect(slot);
        }

        if pieces[piece].current_position == pieces[piece].correct_position {
            pieces[piece].locked = true;
            *completed_count += 1;
            if let Some(p) = state.players.iter_mut().find(|p| p.id == player) {
                p.score = p.score.saturating_add(PLACE_SCORE);
            }
        }
        true
    }
}
