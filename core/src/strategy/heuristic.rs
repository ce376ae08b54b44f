//! One-ply corner heuristic.

use super::{best_direction, best_slide, Strategy};
use crate::board::{Board, Direction, SIZE};
use crate::config::HeuristicWeights;
use crate::game::GameState;

/// Picks the move whose resulting board scores best under fixed positional
/// weights. Looks one move ahead; the scored board carries the tile that move
/// spawns.
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategy {
    weights: HeuristicWeights,
}

impl HeuristicStrategy {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Best move for a bare board, scoring slid boards without a spawn.
    pub fn best_move(&self, board: &Board) -> Direction {
        best_slide(board, |b| heuristic_score(b, &self.weights))
    }
}

impl Strategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn choose_move(&mut self, state: &GameState) -> Direction {
        best_direction(state, |b| heuristic_score(b, &self.weights))
    }
}

/// Positional sum, plus a bonus when the top-left cell holds the max tile,
/// plus a bonus per empty cell.
pub fn heuristic_score(board: &Board, weights: &HeuristicWeights) -> i64 {
    let mut score = 0;
    for r in 0..SIZE {
        for c in 0..SIZE {
            score += i64::from(board.get(r, c)) * weights.matrix[r][c];
        }
    }

    let max = board.max_tile();
    if board.get(0, 0) == max {
        score += i64::from(max) * weights.corner;
    }

    score + board.empty_count() as i64 * weights.empty
}
