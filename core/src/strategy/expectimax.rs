//! Depth-limited expectimax search.
//!
//! Max nodes try every direction that changes the board; chance nodes place
//! a 2 on each empty cell in turn and average the results uniformly. The
//! search does not model 4-tiles. Leaves are scored by [`evaluate`].

use std::collections::HashMap;

use log::debug;

use super::{best_direction, best_slide, Strategy};
use crate::board::{Board, Direction, SIZE};
use crate::config::{EvalWeights, SearchConfig};
use crate::game::GameState;

/// Whose turn a search node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// The player picks a direction.
    Max,
    /// A tile appears on a random empty cell.
    Chance,
}

/// Counters for the most recent decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
}

/// Expectimax player.
#[derive(Debug, Clone, Default)]
pub struct ExpectimaxStrategy {
    config: SearchConfig,
    last_stats: SearchStats,
}

impl ExpectimaxStrategy {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            last_stats: SearchStats::default(),
        }
    }

    pub fn with_depth(depth: u32) -> Self {
        Self::new(SearchConfig {
            depth,
            ..SearchConfig::default()
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Stats of the last decision.
    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Pick the direction whose `apply_move` result, spawned tile included,
    /// has the best chance-node value at `depth`. Each decision starts with an
    /// empty cache.
    pub fn choose_move_at_depth(&mut self, state: &GameState, depth: u32) -> Direction {
        let mut search = Search::new(&self.config.weights, self.config.cache);
        let dir = best_direction(state, |next| search.value(next, depth, Node::Chance));
        let stats = search.stats;
        self.finish(stats, depth, dir)
    }

    /// Like [`choose_move_at_depth`](Self::choose_move_at_depth) for a bare
    /// board: slid boards are searched without a spawn.
    pub fn best_move_at_depth(&mut self, board: &Board, depth: u32) -> Direction {
        let mut search = Search::new(&self.config.weights, self.config.cache);
        let dir = best_slide(board, |slid| search.value(slid, depth, Node::Chance));
        let stats = search.stats;
        self.finish(stats, depth, dir)
    }

    fn finish(&mut self, stats: SearchStats, depth: u32, dir: Direction) -> Direction {
        self.last_stats = stats;
        debug!(
            "expectimax depth={} nodes={} cache_hits={} move={}",
            depth, stats.nodes, stats.cache_hits, dir
        );
        dir
    }

    /// Root value of every direction in [`Direction::ALL`] order, `None` for
    /// directions that do not change the board.
    pub fn branch_values(&mut self, board: &Board) -> [Option<f64>; 4] {
        let mut search = Search::new(&self.config.weights, self.config.cache);
        let values = Direction::ALL.map(|dir| {
            let slide = board.slide(dir);
            slide
                .changed
                .then(|| search.value(&slide.board, self.config.depth, Node::Chance))
        });
        self.last_stats = search.stats;
        values
    }
}

impl Strategy for ExpectimaxStrategy {
    fn name(&self) -> &'static str {
        "expectimax"
    }

    fn choose_move(&mut self, state: &GameState) -> Direction {
        self.choose_move_at_depth(state, self.config.depth)
    }
}

/// Value of `board` as a `node` with `depth` plies left, without caching.
pub fn expectimax(board: &Board, depth: u32, node: Node, weights: &EvalWeights) -> f64 {
    Search::new(weights, false).value(board, depth, node)
}

/// One decision's worth of search state.
struct Search<'a> {
    weights: &'a EvalWeights,
    cache: Option<HashMap<(Board, u32, Node), f64>>,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    fn new(weights: &'a EvalWeights, cache: bool) -> Self {
        Self {
            weights,
            cache: cache.then(HashMap::new),
            stats: SearchStats::default(),
        }
    }

    fn value(&mut self, board: &Board, depth: u32, node: Node) -> f64 {
        self.stats.nodes += 1;

        if depth == 0 || board.is_terminal() {
            return evaluate(board, self.weights);
        }

        let key = (*board, depth, node);
        if let Some(&cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            self.stats.cache_hits += 1;
            return cached;
        }

        let value = match node {
            Node::Max => self.max_node(board, depth),
            Node::Chance => self.chance_node(board, depth),
        };

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(key, value);
        }
        value
    }

    fn max_node(&mut self, board: &Board, depth: u32) -> f64 {
        let mut best: Option<f64> = None;
        for dir in Direction::ALL {
            let slide = board.slide(dir);
            if !slide.changed {
                continue;
            }
            let value = self.value(&slide.board, depth - 1, Node::Chance);
            best = Some(best.map_or(value, |b| b.max(value)));
        }
        best.unwrap_or_else(|| evaluate(board, self.weights))
    }

    fn chance_node(&mut self, board: &Board, depth: u32) -> f64 {
        let empty = board.empty_cells();
        if empty.is_empty() {
            return 0.0;
        }

        let total: f64 = empty
            .iter()
            .map(|&i| self.value(&board.with_tile(i, 2), depth - 1, Node::Max))
            .sum();
        total / empty.len() as f64
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Static score of a board: open cells, monotone lines, smooth neighbours and
/// the max tile held in a corner.
pub fn evaluate(board: &Board, weights: &EvalWeights) -> f64 {
    board.empty_count() as f64 * weights.empty
        + f64::from(monotonicity(board)) * weights.monotonicity
        + smoothness(board) as f64 * weights.smoothness
        + f64::from(corner_max(board)) * weights.corner
}

/// Adjacent pairs (per row and per column) ordered in each direction.
/// An equal pair counts for both directions.
fn monotonicity(board: &Board) -> u32 {
    let mut score = 0;
    for a in 0..SIZE {
        for b in 0..SIZE - 1 {
            for (x, y) in [
                (board.get(a, b), board.get(a, b + 1)),
                (board.get(b, a), board.get(b + 1, a)),
            ] {
                score += u32::from(x >= y) + u32::from(y >= x);
            }
        }
    }
    score
}

/// Minus the summed differences between non-empty neighbours.
fn smoothness(board: &Board) -> i64 {
    let mut score = 0;
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = i64::from(board.get(r, c));
            if v == 0 {
                continue;
            }
            if c + 1 < SIZE && board.get(r, c + 1) != 0 {
                score -= (v - i64::from(board.get(r, c + 1))).abs();
            }
            if r + 1 < SIZE && board.get(r + 1, c) != 0 {
                score -= (v - i64::from(board.get(r + 1, c))).abs();
            }
        }
    }
    score
}

/// The max tile if its first occurrence in row-major order is a corner,
/// else 0.
fn corner_max(board: &Board) -> u32 {
    let mut max = 0;
    let mut at = 0;
    for (i, &v) in board.cells().iter().enumerate() {
        if v > max {
            max = v;
            at = i;
        }
    }
    let (r, c) = (at / SIZE, at % SIZE);
    if max > 0 && (r == 0 || r == SIZE - 1) && (c == 0 || c == SIZE - 1) {
        max
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn weights() -> EvalWeights {
        EvalWeights::default()
    }

    fn random_board(rng: &mut SmallRng, tiles: usize) -> Board {
        let mut board = Board::EMPTY;
        for _ in 0..tiles {
            let i = rng.gen_range(0..16);
            board = board.with_tile(i, 1 << rng.gen_range(1..6));
        }
        board
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    #[test]
    fn test_evaluate_empty_board() {
        // 16 empty * 20 + 48 monotone pairs * 1.5
        assert_eq!(evaluate(&Board::EMPTY, &weights()), 320.0 + 72.0);
    }

    #[test]
    fn test_evaluate_single_corner_tile() {
        let board = Board::EMPTY.with_tile(0, 2);
        assert_eq!(monotonicity(&board), 46);
        assert_eq!(smoothness(&board), 0);
        assert_eq!(corner_max(&board), 2);
        assert_eq!(evaluate(&board, &weights()), 15.0 * 20.0 + 46.0 * 1.5 + 20.0);
    }

    #[test]
    fn test_smoothness_skips_empty_neighbours() {
        let board = Board::from_rows([[2, 4, 0, 8], [2, 0, 0, 0], [0; 4], [0; 4]]);
        // (2,4) across, (2,2) down; 4 and 8 have no non-empty neighbour pair.
        assert_eq!(smoothness(&board), -2);
    }

    #[test]
    fn test_corner_max() {
        let bottom_right = Board::EMPTY.with_tile(15, 128).with_tile(5, 64);
        assert_eq!(corner_max(&bottom_right), 128);
        let center = Board::EMPTY.with_tile(5, 128).with_tile(0, 64);
        assert_eq!(corner_max(&center), 0);
        assert_eq!(corner_max(&Board::EMPTY), 0);
    }

    #[test]
    fn test_corner_max_uses_first_occurrence() {
        // First 64 sits at (0, 1); the copy in the top-right corner is ignored.
        let edge_first = Board::from_rows([[0, 64, 0, 64], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(corner_max(&edge_first), 0);

        let corner_first = Board::from_rows([[64, 0, 0, 0], [0, 64, 0, 0], [0; 4], [0; 4]]);
        assert_eq!(corner_max(&corner_first), 64);

        let center_first = Board::from_rows([[0; 4], [0, 32, 0, 0], [0; 4], [0, 0, 0, 32]]);
        assert_eq!(corner_max(&center_first), 0);
    }

    // -------------------------------------------------------------------------
    // Search values
    // -------------------------------------------------------------------------

    #[test]
    fn test_depth_zero_is_static_evaluation() {
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..20 {
            let board = random_board(&mut rng, 6);
            let expected = evaluate(&board, &weights());
            assert_eq!(expectimax(&board, 0, Node::Max, &weights()), expected);
            assert_eq!(expectimax(&board, 0, Node::Chance, &weights()), expected);
        }
    }

    #[test]
    fn test_chance_node_averages_over_empty_cells() {
        let board = Board::from_rows([[2, 4, 8, 16], [4, 8, 16, 2], [8, 16, 2, 4], [0, 0, 4, 8]]);
        let expected = (evaluate(&board.with_tile(12, 2), &weights())
            + evaluate(&board.with_tile(13, 2), &weights()))
            / 2.0;
        assert_eq!(expectimax(&board, 1, Node::Chance, &weights()), expected);
    }

    #[test]
    fn test_chance_node_without_empty_cells_is_zero() {
        // Full but not terminal: the bottom row still merges.
        let board = Board::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 8, 16, 32]]);
        assert!(!board.is_terminal());
        assert_eq!(expectimax(&board, 1, Node::Chance, &weights()), 0.0);
    }

    #[test]
    fn test_max_node_takes_best_child() {
        let board = Board::from_rows([[0, 0, 4, 4], [0; 4], [0; 4], [0; 4]]);
        let expected = Direction::ALL
            .iter()
            .map(|&d| board.slide(d))
            .filter(|s| s.changed)
            .map(|s| evaluate(&s.board, &weights()))
            .fold(f64::MIN, f64::max);
        assert_eq!(expectimax(&board, 1, Node::Max, &weights()), expected);
    }

    #[test]
    fn test_terminal_board_is_static_at_any_depth() {
        let board = Board::from_cells([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);
        let expected = evaluate(&board, &weights());
        for depth in 0..4 {
            assert_eq!(expectimax(&board, depth, Node::Max, &weights()), expected);
            assert_eq!(expectimax(&board, depth, Node::Chance, &weights()), expected);
        }
    }

    // -------------------------------------------------------------------------
    // Move selection
    // -------------------------------------------------------------------------

    #[test]
    fn test_cache_does_not_change_values() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut cached = ExpectimaxStrategy::default();
        let mut plain = ExpectimaxStrategy::new(SearchConfig {
            cache: false,
            ..SearchConfig::default()
        });
        for _ in 0..10 {
            let board = random_board(&mut rng, 8);
            assert_eq!(cached.branch_values(&board), plain.branch_values(&board));
            assert_eq!(
                cached.best_move_at_depth(&board, 2),
                plain.best_move_at_depth(&board, 2)
            );
        }
    }

    #[test]
    fn test_stats_are_recorded() {
        let mut cached = ExpectimaxStrategy::default();
        let board = Board::EMPTY.with_tile(0, 2).with_tile(1, 2).with_tile(6, 4);
        // Depth 3 reaches the same chance boards through different placements.
        cached.best_move_at_depth(&board, 3);
        let with_cache = cached.last_stats();
        assert!(with_cache.nodes > 0);
        assert!(with_cache.cache_hits > 0);

        let mut plain = ExpectimaxStrategy::new(SearchConfig {
            cache: false,
            ..SearchConfig::default()
        });
        plain.best_move_at_depth(&board, 3);
        assert_eq!(plain.last_stats().cache_hits, 0);
        assert!(plain.last_stats().nodes >= with_cache.nodes);
    }

    #[test]
    fn test_choose_move_matches_branch_values() {
        let board = Board::from_rows([[2, 0, 0, 2], [4, 0, 0, 0], [0; 4], [8, 0, 0, 0]]);
        let mut strategy = ExpectimaxStrategy::default();
        let values = strategy.branch_values(&board);
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in values.iter().enumerate() {
            if let Some(v) = *v {
                if best.map_or(true, |(_, b)| v > b) {
                    best = Some((i, v));
                }
            }
        }
        let expected = Direction::ALL[best.unwrap().0];
        assert_eq!(strategy.best_move_at_depth(&board, 2), expected);
    }

    #[test]
    fn test_never_picks_a_non_changing_move() {
        let mut rng = SmallRng::seed_from_u64(23);
        let mut strategy = ExpectimaxStrategy::with_depth(1);
        for _ in 0..30 {
            let board = random_board(&mut rng, 10);
            if board.is_terminal() {
                continue;
            }
            let dir = strategy.best_move_at_depth(&board, 1);
            assert!(board.can_slide(dir), "{dir} does not change {board:?}");
        }
    }

    #[test]
    fn test_stuck_board_returns_default() {
        let board = Board::from_cells([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);
        let mut strategy = ExpectimaxStrategy::default();
        assert_eq!(strategy.best_move_at_depth(&board, 2), Direction::Up);
        assert_eq!(strategy.branch_values(&board), [None; 4]);
    }

    #[test]
    fn test_depth_zero_scores_slid_boards_statically() {
        let board = Board::from_rows([[0, 0, 4, 4], [0; 4], [0; 4], [0; 4]]);
        let mut strategy = ExpectimaxStrategy::with_depth(0);
        let expected = Direction::ALL
            .iter()
            .copied()
            .filter(|&d| board.can_slide(d))
            .fold(None::<(Direction, f64)>, |best, d| {
                let v = evaluate(&board.slide(d).board, &weights());
                match best {
                    Some((_, b)) if v <= b => best,
                    _ => Some((d, v)),
                }
            })
            .map(|(d, _)| d)
            .unwrap();
        assert_eq!(strategy.best_move_at_depth(&board, 0), expected);
    }

    #[test]
    fn test_choose_move_searches_board_after_spawn() {
        let mut strategy = ExpectimaxStrategy::with_depth(1);
        for seed in 0..10 {
            let state = GameState::new(GameConfig::default(), seed);
            let mut expected: Option<(Direction, f64)> = None;
            for dir in Direction::ALL {
                let (next, changed) = state.apply_move(dir);
                if !changed {
                    continue;
                }
                let value = expectimax(next.board(), 1, Node::Chance, &weights());
                if expected.map_or(true, |(_, best)| value > best) {
                    expected = Some((dir, value));
                }
            }
            let expected = expected.map_or(Direction::Up, |(dir, _)| dir);
            assert_eq!(strategy.choose_move_at_depth(&state, 1), expected, "seed {seed}");
        }
    }

    #[test]
    fn test_choose_move_through_trait() {
        let mut strategy = ExpectimaxStrategy::default();
        let state = GameState::new(GameConfig::default(), 8);
        let dir = strategy.choose_move(&state);
        assert!(state.board().can_slide(dir));
        assert_eq!(strategy.name(), "expectimax");
    }
}
