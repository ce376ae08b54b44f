//! Move-selection strategies.
//!
//! - [`HeuristicStrategy`]: one-ply, snake-shaped positional weights.
//! - [`ExpectimaxStrategy`]: depth-limited expectimax with a hand-tuned
//!   leaf evaluation.
//! - [`CornerStrategy`]: alternates right and down.
//!
//! Strategies only read the live state; every candidate move is simulated
//! with [`GameState::apply_move`] on a copy, spawned tile included. When no
//! direction changes the board they return [`Direction::Up`], so callers must
//! check [`GameState::is_terminal`](crate::game::GameState::is_terminal)
//! themselves before looping.

use crate::board::{Board, Direction};
use crate::config::{Config, StrategyKind};
use crate::game::GameState;

mod corner;
mod expectimax;
mod heuristic;

pub use corner::CornerStrategy;
pub use expectimax::{evaluate, expectimax, ExpectimaxStrategy, Node, SearchStats};
pub use heuristic::{heuristic_score, HeuristicStrategy};

/// Direction returned when nothing can move.
pub const DEFAULT_MOVE: Direction = Direction::Up;

/// A policy that picks the next move for a game.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn choose_move(&mut self, state: &GameState) -> Direction;
}

/// Build the strategy named by `config.strategy`.
pub fn build(config: &Config) -> Box<dyn Strategy> {
    match config.strategy {
        StrategyKind::Heuristic => Box::new(HeuristicStrategy::new(config.heuristic)),
        StrategyKind::Expectimax => Box::new(ExpectimaxStrategy::new(config.search)),
        StrategyKind::Corner => Box::new(CornerStrategy::new()),
    }
}

/// Simulate [`GameState::apply_move`] toward every direction and keep the
/// direction whose resulting board scores best.
///
/// The scored board includes the tile spawned by the move. The copy draws it
/// from the state's own RNG, so the choice depends only on `state`. Ties go
/// to the earliest direction in [`Direction::ALL`]; with no changing
/// direction the result is [`DEFAULT_MOVE`].
fn best_direction<S, F>(state: &GameState, mut score: F) -> Direction
where
    S: PartialOrd,
    F: FnMut(&Board) -> S,
{
    pick_best(Direction::ALL.into_iter().filter_map(|dir| {
        let (next, changed) = state.apply_move(dir);
        changed.then(|| (dir, score(next.board())))
    }))
}

/// Like [`best_direction`] for a bare board: scores the slid board, with no
/// tile spawned.
fn best_slide<S, F>(board: &Board, mut score: F) -> Direction
where
    S: PartialOrd,
    F: FnMut(&Board) -> S,
{
    pick_best(Direction::ALL.into_iter().filter_map(|dir| {
        let slide = board.slide(dir);
        slide.changed.then(|| (dir, score(&slide.board)))
    }))
}

fn pick_best<S: PartialOrd>(candidates: impl Iterator<Item = (Direction, S)>) -> Direction {
    let mut best: Option<(Direction, S)> = None;
    for (dir, value) in candidates {
        if best.as_ref().map_or(true, |(_, b)| value > *b) {
            best = Some((dir, value));
        }
    }
    best.map_or(DEFAULT_MOVE, |(dir, _)| dir)
}
