//! Room code generation.

use rand::Rng;

use partyroom_protocol::RoomCode;

use crate::RoomError;

/// Fresh draws tried before giving up. With 32^5 possible codes this only
/// runs out when the server is absurdly full.
const MAX_ATTEMPTS: usize = 64;

/// Draws random codes until one is not `taken`.
pub(crate) fn generate_code<R, F>(rng: &mut R, taken: F) -> Result<RoomCode, RoomError>
where
    R: Rng + ?Sized,
    F: Fn(&RoomCode) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let indices = std::array::from_fn(|_| rng.random_range(0..RoomCode::ALPHABET.len()));
        let code = RoomCode::from_indices(indices);
        if !taken(&code) {
            return Ok(code);
        }
        tracing::debug!(room_code = %code, "room code collision, retrying");
    }
    Err(RoomError::CodesExhausted)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let code = generate_code(&mut rng, |_| false).unwrap();
            assert!(RoomCode::is_well_formed(code.as_str()), "bad code {code}");
        }
    }

    #[test]
    fn test_generate_code_skips_taken() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut taken = HashSet::new();
        for _ in 0..100 {
            let code = generate_code(&mut rng, |c| taken.contains(c)).unwrap();
            assert!(taken.insert(code));
        }
    }

    #[test]
    fn test_generate_code_retries_on_collision() {
        // Replay the same seed so the first draw is known to be taken.
        let first = generate_code(&mut StdRng::seed_from_u64(3), |_| false).unwrap();
        let code = generate_code(&mut StdRng::seed_from_u64(3), |c| *c == first).unwrap();
        assert_ne!(code, first);
    }

    #[test]
    fn test_generate_code_gives_up_when_everything_is_taken() {
        let mut rng = StdRng::seed_from_u64(4);
        let err = generate_code(&mut rng, |_| true).unwrap_err();
        assert!(matches!(err, RoomError::CodesExhausted));
    }
}
