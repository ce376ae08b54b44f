//! Random tile insertion.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::Board;
use crate::config::SpawnPolicy;

/// Place one tile on a uniformly chosen empty cell.
///
/// Returns the new board and the index that was filled, or `None` when the
/// board has no empty cell. Callers only spawn after a move that changed the
/// board, which always leaves at least one cell free.
pub fn spawn_tile<R: Rng + ?Sized>(
    board: &Board,
    policy: SpawnPolicy,
    rng: &mut R,
) -> Option<(Board, usize)> {
    let empty = board.empty_cells();
    let &index = empty.choose(rng)?;
    let value = tile_value(board, policy, rng);
    Some((board.with_tile(index, value), index))
}

/// Draw the value of the next tile under `policy`.
pub fn tile_value<R: Rng + ?Sized>(board: &Board, policy: SpawnPolicy, rng: &mut R) -> u32 {
    match policy {
        SpawnPolicy::Standard { two_probability } => {
            if rng.gen::<f64>() < two_probability {
                2
            } else {
                4
            }
        }
        SpawnPolicy::Restricted => 2,
        SpawnPolicy::Adaptive => {
            let (lo, hi) = adaptive_range(board);
            1 << rng.gen_range(lo..=hi)
        }
    }
}

/// Exponent range used by [`SpawnPolicy::Adaptive`].
fn adaptive_range(board: &Board) -> (u32, u32) {
    let Some(min) = board.min_tile() else {
        return (1, 1);
    };
    let hi = (board.max_tile() / 2).max(2).trailing_zeros();
    let lo = min.trailing_zeros().min(hi);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_fills_an_empty_cell() {
        let mut rng = SmallRng::seed_from_u64(7);
        let board = Board::EMPTY.with_tile(0, 2).with_tile(5, 4);
        let (next, index) = spawn_tile(&board, SpawnPolicy::default(), &mut rng).unwrap();
        assert_eq!(board.get(index / 4, index % 4), 0);
        assert_ne!(next.cells()[index], 0);
        assert_eq!(next.empty_count(), board.empty_count() - 1);
    }

    #[test]
    fn test_spawn_on_full_board_does_nothing() {
        let mut rng = SmallRng::seed_from_u64(7);
        let full = Board::from_cells([2; 16]);
        assert!(spawn_tile(&full, SpawnPolicy::Restricted, &mut rng).is_none());
    }

    #[test]
    fn test_restricted_always_two() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(tile_value(&Board::EMPTY, SpawnPolicy::Restricted, &mut rng), 2);
        }
    }

    #[test]
    fn test_standard_mixes_twos_and_fours() {
        let mut rng = SmallRng::seed_from_u64(99);
        let policy = SpawnPolicy::default();
        let values: Vec<u32> = (0..1000)
            .map(|_| tile_value(&Board::EMPTY, policy, &mut rng))
            .collect();
        let fours = values.iter().filter(|&&v| v == 4).count();
        assert!(values.iter().all(|&v| v == 2 || v == 4));
        // Expect about 100 fours.
        assert!((40..200).contains(&fours), "got {fours} fours");
    }

    #[test]
    fn test_standard_extreme_probabilities() {
        let mut rng = SmallRng::seed_from_u64(3);
        let only_twos = SpawnPolicy::Standard {
            two_probability: 1.0,
        };
        let only_fours = SpawnPolicy::Standard {
            two_probability: 0.0,
        };
        for _ in 0..100 {
            assert_eq!(tile_value(&Board::EMPTY, only_twos, &mut rng), 2);
            assert_eq!(tile_value(&Board::EMPTY, only_fours, &mut rng), 4);
        }
    }

    #[test]
    fn test_adaptive_range() {
        assert_eq!(adaptive_range(&Board::EMPTY), (1, 1));

        // min 4, max 64 -> 4..=32
        let board = Board::EMPTY.with_tile(0, 64).with_tile(1, 4);
        assert_eq!(adaptive_range(&board), (2, 5));

        // A lone large tile clamps the lower bound to the upper one.
        let lone = Board::EMPTY.with_tile(0, 2048);
        assert_eq!(adaptive_range(&lone), (10, 10));

        let twos = Board::EMPTY.with_tile(0, 2).with_tile(1, 2);
        assert_eq!(adaptive_range(&twos), (1, 1));
    }

    #[test]
    fn test_adaptive_values_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        let board = Board::EMPTY.with_tile(0, 256).with_tile(1, 8);
        for _ in 0..500 {
            let v = tile_value(&board, SpawnPolicy::Adaptive, &mut rng);
            assert!(v.is_power_of_two());
            assert!((8..=128).contains(&v), "got {v}");
        }
    }
}
