//! Race mode: run laps through a ring of checkpoints against the clock.

use std::f64::consts::TAU;
use std::time::Duration;

use rand::RngCore;

use crate::{Board, GameMode, GameState, ModeEngine, Outcome, Rect, integrate};

pub const CHECKPOINT_COUNT: usize = 8;
pub const TRACK_CENTER: (f64, f64) = (400.0, 400.0);
pub const TRACK_RADIUS: f64 = 300.0;
pub const CHECKPOINT_SIZE: f64 = 50.0;

/// Score for the player who closes a lap.
pub const LAP_SCORE: u32 = 100;

/// The race ends after this many seconds.
pub const TIME_LIMIT_SECS: u64 = 180;

/// A score at or above this when time runs out counts as a win.
pub const WINNING_SCORE: u32 = 300;

/// Race rules.
///
/// The checkpoint index is shared by the whole room: whoever touches the
/// active checkpoint advances it for everyone, and whoever touches the last
/// one closes the lap and takes [`LAP_SCORE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RaceMode;

fn checkpoints() -> Vec<Rect> {
    let (cx, cy) = TRACK_CENTER;
    let half = CHECKPOINT_SIZE / 2.0;
    (0..CHECKPOINT_COUNT)
        .map(|i| {
            let angle = i as f64 / CHECKPOINT_COUNT as f64 * TAU;
            Rect::new(
                cx + angle.cos() * TRACK_RADIUS - half,
                cy + angle.sin() * TRACK_RADIUS - half,
                CHECKPOINT_SIZE,
                CHECKPOINT_SIZE,
            )
        })
        .collect()
}

impl ModeEngine for RaceMode {
    fn mode(&self) -> GameMode {
        GameMode::Race
    }

    fn build_board(&self, _player_count: usize, _rng: &mut dyn RngCore) -> Board {
        Board::Race {
            checkpoints: checkpoints(),
            current_checkpoint: 0,
        }
    }

    fn advance(&self, state: &mut GameState, _dt: Duration) {
        integrate(&mut state.players);

        let Board::Race {
            checkpoints,
            current_checkpoint,
        } = &mut state.board
        else {
            return;
        };
        if checkpoints.is_empty() {
            return;
        }

        // Players are checked in order against whatever checkpoint is
        // active at that moment, so two players can advance it twice in
        // one tick.
        for player in &mut state.players {
            if checkpoints[*current_checkpoint].contains(player.x, player.y) {
                *current_checkpoint += 1;
                if *current_checkpoint >= checkpoints.len() {
                    *current_checkpoint = 0;
                    player.score = player.score.saturating_add(LAP_SCORE);
                }
            }
        }
    }

    fn is_terminal(&self, state: &GameState) -> Option<Outcome> {
        if state.elapsed_secs < TIME_LIMIT_SECS {
            return None;
        }
        let win = state.players.iter().any(|p| p.score >= WINNING_SCORE);
        Some(state.outcome(win))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::{Entrant, PlayerId};

    fn race(players: u64) -> GameState {
        let entrants: Vec<Entrant> = (1..=players)
            .map(|i| Entrant {
                id: PlayerId(i),
                username: format!("p{i}"),
            })
            .collect();
        let mut state = RaceMode.initialize(&entrants, &mut StdRng::seed_from_u64(3));
        // Park everyone in the middle of the ring, away from checkpoints.
        for p in &mut state.players {
            p.x = 400.0;
            p.y = 400.0;
        }
        state
    }

    fn current(state: &GameState) -> usize {
        match state.board {
            Board::Race {
                current_checkpoint, ..
            } => current_checkpoint,
            _ => unreachable!(),
        }
    }

    fn checkpoint_center(state: &GameState, i: usize) -> (f64, f64) {
        match &state.board {
            Board::Race { checkpoints, .. } => checkpoints[i].center(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_checkpoints_form_ring() {
        let cps = checkpoints();
        assert_eq!(cps.len(), 8);
        // First checkpoint sits at angle 0: right of the center.
        assert_eq!(cps[0].center(), (700.0, 400.0));
        for cp in &cps {
            let (x, y) = cp.center();
            let r = (x - 400.0).hypot(y - 400.0);
            assert!((r - TRACK_RADIUS).abs() < 1e-9);
        }
    }

    #[test]
    fn test_touching_active_checkpoint_advances_shared_index() {
        let mut state = race(2);
        let (x, y) = checkpoint_center(&state, 0);
        state.players[1].x = x;
        state.players[1].y = y;

        RaceMode.advance(&mut state, Duration::ZERO);

        assert_eq!(current(&state), 1);
        assert_eq!(state.players[1].score, 0);
    }

    #[test]
    fn test_touching_inactive_checkpoint_does_nothing() {
        let mut state = race(1);
        let (x, y) = checkpoint_center(&state, 3);
        state.players[0].x = x;
        state.players[0].y = y;

        RaceMode.advance(&mut state, Duration::ZERO);

        assert_eq!(current(&state), 0);
    }

    #[test]
    fn test_closing_lap_wraps_and_scores() {
        let mut state = race(2);
        if let Board::Race {
            current_checkpoint, ..
        } = &mut state.board
        {
            *current_checkpoint = 7;
        }
        let (x, y) = checkpoint_center(&state, 7);
        state.players[0].x = x;
        state.players[0].y = y;

        RaceMode.advance(&mut state, Duration::ZERO);

        assert_eq!(current(&state), 0);
        assert_eq!(state.players[0].score, LAP_SCORE);
        assert_eq!(state.players[1].score, 0);
    }

    #[test]
    fn test_lap_score_saturates() {
        let mut state = race(1);
        if let Board::Race {
            current_checkpoint, ..
        } = &mut state.board
        {
            *current_checkpoint = 7;
        }
        let (x, y) = checkpoint_center(&state, 7);
        state.players[0].x = x;
        state.players[0].y = y;
        state.players[0].score = u32::MAX - 1;

        RaceMode.advance(&mut state, Duration::ZERO);

        assert_eq!(state.players[0].score, u32::MAX);
    }

    #[test]
    fn test_is_terminal_before_time_limit() {
        let mut state = race(2);
        state.players[0].score = 1000;
        state.elapsed_secs = 179;
        assert!(RaceMode.is_terminal(&state).is_none());
    }

    #[test]
    fn test_is_terminal_at_time_limit_without_winner() {
        let mut state = race(2);
        state.players[0].score = 299;
        state.elapsed_secs = 180;
        let outcome = RaceMode.is_terminal(&state).expect("time is up");
        assert!(!outcome.win);
        assert_eq!(outcome.elapsed_secs, 180);
    }

    #[test]
    fn test_is_terminal_at_time_limit_with_winner() {
        let mut state = race(2);
        state.players[1].score = 300;
        state.elapsed_secs = 200;
        let outcome = RaceMode.is_terminal(&state).expect("time is up");
        assert!(outcome.win);
    }
}
