//! Classic mode: collect every pickup in the arena.

use std::time::Duration;

use rand::{Rng, RngCore};

use crate::{
    Board, Collectible, GameMode, GameState, ModeEngine, Outcome, Rect,
    SPAWN_MAX, SPAWN_MIN, integrate,
};

/// Collectibles spawned per player.
pub const COLLECTIBLES_PER_PLAYER: usize = 5;

/// A player closer than this to a collectible picks it up.
pub const PICKUP_RADIUS: f64 = 30.0;

pub const COLLECTIBLE_SCORE: u32 = 10;
pub const GOAL_SCORE: u32 = 50;

const COLLECTIBLE_RADIUS: f64 = 10.0;

const PLATFORMS: [Rect; 5] = [
    Rect::new(100.0, 600.0, 200.0, 20.0),
    Rect::new(400.0, 500.0, 200.0, 20.0),
    Rect::new(200.0, 400.0, 200.0, 20.0),
    Rect::new(500.0, 300.0, 200.0, 20.0),
    Rect::new(100.0, 200.0, 200.0, 20.0),
];

const GOAL: Rect = Rect::new(400.0, 50.0, 50.0, 50.0);

/// Classic rules.
///
/// - Every collectible within [`PICKUP_RADIUS`] of a player is removed and
///   credited to that player.
/// - A player inside the goal earns [`GOAL_SCORE`] on every tick they stay
///   there. There is no once-per-game guard.
/// - The game ends, always as a win, when nothing is left to collect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicMode;

impl ModeEngine for ClassicMode {
    fn mode(&self) -> GameMode {
        GameMode::Classic
    }

    fn build_board(&self, player_count: usize, rng: &mut dyn RngCore) -> Board {
        let collectibles = (0..player_count * COLLECTIBLES_PER_PLAYER)
            .map(|_| Collectible {
                x: rng.random_range(SPAWN_MIN..=SPAWN_MAX),
                y: rng.random_range(SPAWN_MIN..=SPAWN_MAX),
                radius: COLLECTIBLE_RADIUS,
            })
            .collect();

        Board::Classic {
            platforms: PLATFORMS.to_vec(),
            collectibles,
            goal: GOAL,
        }
    }

    fn advance(&self, state: &mut GameState, _dt: Duration) {
        integrate(&mut state.players);

        let Board::Classic {
            collectibles, goal, ..
        } = &mut state.board
        else {
            return;
        };

        for player in &mut state.players {
            collectibles.retain(|item| {
                let dist = (player.x - item.x).hypot(player.y - item.y);
                if dist < PICKUP_RADIUS {
                    player.score = player.score.saturating_add(COLLECTIBLE_SCORE);
                    player.collected += 1;
                    false
                } else {
                    true
                }
            });

            if goal.contains(player.x, player.y) {
                player.score = player.score.saturating_add(GOAL_SCORE);
            }
        }
    }

    fn is_terminal(&self, state: &GameState) -> Option<Outcome> {
        match &state.board {
            Board::Classic { collectibles, .. } if collectibles.is_empty() => {
                Some(state.outcome(true))
            }
            _ => None,
        }
    }
}
