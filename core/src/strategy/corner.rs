//! Right/down alternation, a baseline for the searching players.

use super::{Strategy, DEFAULT_MOVE};
use crate::board::{Board, Direction};
use crate::game::GameState;

/// Alternates right and down to pile tiles into the bottom-right corner.
///
/// Falls back to the other preferred move, then to the first direction that
/// changes the board.
#[derive(Debug, Clone, Default)]
pub struct CornerStrategy {
    last: Option<Direction>,
}

impl CornerStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_move(&mut self, board: &Board) -> Direction {
        let preferred = match self.last {
            Some(Direction::Right) => [Direction::Down, Direction::Right],
            _ => [Direction::Right, Direction::Down],
        };

        let dir = preferred
            .into_iter()
            .chain(Direction::ALL)
            .find(|&d| board.can_slide(d))
            .unwrap_or(DEFAULT_MOVE);
        self.last = Some(dir);
        dir
    }
}

impl Strategy for CornerStrategy {
    fn name(&self) -> &'static str {
        "corner"
    }

    fn choose_move(&mut self, state: &GameState) -> Direction {
        self.best_move(state.board())
    }
}
