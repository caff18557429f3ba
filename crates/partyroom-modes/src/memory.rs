//! Memory mode: find all matching card pairs.

use std::time::Duration;

use rand::RngCore;

use crate::{
    Board, GameMode, GameState, MemoryCard, ModeEngine, Outcome, PlayerAction, PlayerId,
    Rect, integrate,
};

pub const PAIR_COUNT: usize = 8;
pub const CARD_SIZE: f64 = 100.0;

/// Score for completing a pair.
pub const MATCH_SCORE: u32 = 20;

const GRID_COLUMNS: usize = 4;
const GRID_ORIGIN: f64 = 100.0;
const GRID_STRIDE: f64 = 150.0;

fn cell(column: usize, row: usize) -> Rect {
    Rect::new(
        GRID_ORIGIN + column as f64 * GRID_STRIDE,
        GRID_ORIGIN + row as f64 * GRID_STRIDE,
        CARD_SIZE,
        CARD_SIZE,
    )
}

/// The fixed 4×4 layout.
///
/// Pair `i` puts its first card in the top half at cell `i` and its twin in
/// the bottom half, shifted two columns over. Cards are stored pair by
/// pair, so card `2i` and `2i + 1` share `pair_id == i`.
fn cards() -> Vec<MemoryCard> {
    let rows_per_half = PAIR_COUNT / GRID_COLUMNS;
    (0..PAIR_COUNT)
        .flat_map(|pair| {
            let col = pair % GRID_COLUMNS;
            let row = pair / GRID_COLUMNS;
            let twin_col = (col + 2) % GRID_COLUMNS;
            let twin_row = row + rows_per_half;
            [cell(col, row), cell(twin_col, twin_row)].map(|rect| MemoryCard {
                rect,
                pair_id: pair,
                revealed: false,
                matched: false,
            })
        })
        .collect()
}

/// Memory rules.
///
/// A [`PlayerAction::FlipCard`] turns a face-down card up. If two unmatched
/// cards were already showing, they are turned back down first. When the
/// flip leaves exactly two unmatched cards showing and they share a
/// `pair_id`, both are matched and the flipping player earns
/// [`MATCH_SCORE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryMode;

impl ModeEngine for MemoryMode {
    fn mode(&self) -> GameMode {
        GameMode::Memory
    }

    fn build_board(&self, _player_count: usize, _rng: &mut dyn RngCore) -> Board {
        Board::Memory {
            cards: cards(),
            matched_pairs: 0,
        }
    }

    fn advance(&self, state: &mut GameState, _dt: Duration) {
        integrate(&mut state.players);
    }

    fn is_terminal(&self, state: &GameState) -> Option<Outcome> {
        match &state.board {
            Board::Memory {
                cards,
                matched_pairs,
            } if *matched_pairs >= cards.len() / 2 => Some(state.outcome(true)),
            _ => None,
        }
    }

    fn apply_action(
        &self,
        state: &mut GameState,
        player: PlayerId,
        action: PlayerAction,
    ) -> bool {
        let PlayerAction::FlipCard { card } = action else {
            return false;
        };
        let Board::Memory {
            cards,
            matched_pairs,
        } = &mut state.board
        else {
            return false;
        };
        match cards.get(card) {
            Some(c) if !c.matched && !c.revealed => {}
            _ => return false,
        }

        let mut showing: Vec<usize> = cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.revealed && !c.matched)
            .map(|(i, _)| i)
            .collect();
        if showing.len() >= 2 {
            for &i in &showing {
                cards[i].revealed = false;
            }
            showing.clear();
        }

        cards[card].revealed = true;

        if let &[other] = showing.as_slice() {
            if cards[other].pair_id == cards[card].pair_id {
                cards[other].matched = true;
                cards[card].matched = true;
                *matched_pairs += 1;
                if let Some(p) = state.players.iter_mut().find(|p| p.id == player) {
                    p.score = p.score.saturating_add(MATCH_SCORE);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::Entrant;

    fn memory() -> GameState {
        let entrants = [
            Entrant {
                id: PlayerId(1),
                username: "a".into(),
            },
            Entrant {
                id: PlayerId(2),
                username: "b".into(),
            },
        ];
        MemoryMode.initialize(&entrants, &mut StdRng::seed_from_u64(5))
    }

    fn cards_of(state: &GameState) -> &Vec<MemoryCard> {
        match &state.board {
            Board::Memory { cards, .. } => cards,
            _ => unreachable!(),
        }
    }

    fn matched(state: &GameState) -> usize {
        match state.board {
            Board::Memory { matched_pairs, .. } => matched_pairs,
            _ => unreachable!(),
        }
    }

    fn flip(state: &mut GameState, player: u64, card: usize) -> bool {
        MemoryMode.apply_action(state, PlayerId(player), PlayerAction::FlipCard { card })
    }

    #[test]
    fn test_layout_has_eight_pairs_without_overlap() {
        let cs = cards();
        assert_eq!(cs.len(), 16);
        for pair in 0..PAIR_COUNT {
            assert_eq!(cs.iter().filter(|c| c.pair_id == pair).count(), 2);
        }
        for (i, a) in cs.iter().enumerate() {
            assert_eq!((a.rect.width, a.rect.height), (100.0, 100.0));
            for b in &cs[i + 1..] {
                assert_ne!((a.rect.x, a.rect.y), (b.rect.x, b.rect.y));
            }
        }
        assert_eq!(cs[0].rect, Rect::new(100.0, 100.0, 100.0, 100.0));
        assert_eq!(cs[1].rect, Rect::new(400.0, 400.0, 100.0, 100.0));
    }

    #[test]
    fn test_flip_matching_pair_scores() {
        let mut state = memory();
        assert!(flip(&mut state, 1, 0));
        assert!(flip(&mut state, 1, 1));

        let cs = cards_of(&state);
        assert!(cs[0].matched && cs[1].matched);
        assert_eq!(matched(&state), 1);
        assert_eq!(state.player(PlayerId(1)).unwrap().score, MATCH_SCORE);
    }

    #[test]
    fn test_match_score_saturates() {
        let mut state = memory();
        state.player_mut(PlayerId(1)).unwrap().score = u32::MAX;
        flip(&mut state, 1, 0);
        flip(&mut state, 1, 1);
        assert_eq!(state.player(PlayerId(1)).unwrap().score, u32::MAX);
    }

    #[test]
    fn test_mismatch_stays_up_until_next_flip() {
        let mut state = memory();
        flip(&mut state, 1, 0);
        flip(&mut state, 2, 2);

        let cs = cards_of(&state);
        assert!(cs[0].revealed && cs[2].revealed);
        assert!(!cs[0].matched && !cs[2].matched);

        // A third flip turns the mismatched pair back over.
        flip(&mut state, 2, 5);
        let cs = cards_of(&state);
        assert!(!cs[0].revealed && !cs[2].revealed);
        assert!(cs[5].revealed);
        assert_eq!(matched(&state), 0);
        assert_eq!(state.player(PlayerId(2)).unwrap().score, 0);
    }

    #[test]
    fn test_matched_cards_stay_up_across_flips() {
        let mut state = memory();
        flip(&mut state, 1, 0);
        flip(&mut state, 1, 1);
        flip(&mut state, 1, 2);
        flip(&mut state, 1, 4);
        flip(&mut state, 1, 6);

        let cs = cards_of(&state);
        assert!(cs[0].revealed && cs[1].revealed);
        assert!(!cs[2].revealed && !cs[4].revealed);
        assert!(cs[6].revealed);
    }

    #[test]
    fn test_flip_ignored_for_revealed_matched_or_missing_card() {
        let mut state = memory();
        flip(&mut state, 1, 0);
        flip(&mut state, 1, 1);
        flip(&mut state, 1, 3);
        let before = state.clone();

        assert!(!flip(&mut state, 1, 0));
        assert!(!flip(&mut state, 1, 3));
        assert!(!flip(&mut state, 1, 16));
        assert!(!MemoryMode.apply_action(
            &mut state,
            PlayerId(1),
            PlayerAction::PlacePiece { piece: 0, slot: 1 },
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_terminal_after_all_pairs() {
        let mut state = memory();
        for pair in 0..PAIR_COUNT {
            assert!(MemoryMode.is_terminal(&state).is_none());
            flip(&mut state, 2, 2 * pair);
            flip(&mut state, 2, 2 * pair + 1);
        }
        let outcome = MemoryMode.is_terminal(&state).expect("all matched");
        assert!(outcome.win);
        assert_eq!(matched(&state), 8);
        assert_eq!(state.player(PlayerId(2)).unwrap().score, 160);
    }
}
