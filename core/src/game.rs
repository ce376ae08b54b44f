//! Live game state: board, score and the random tile stream.

use std::fmt;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::board::{Board, Direction};
use crate::config::GameConfig;
use crate::spawn::spawn_tile;

/// Result of executing a step (move) in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the board changed (and a new tile was spawned).
    pub changed: bool,
    /// Points earned from merges in this move.
    pub reward: u64,
    /// Whether the game is over (no legal moves remaining).
    pub done: bool,
}

/// The 2048 game state.
///
/// Owns its spawn RNG, so a clone replays the same future: two clones fed
/// the same moves stay identical.
#[derive(Clone)]
pub struct GameState {
    board: Board,
    score: u64,
    moves: u32,
    config: GameConfig,
    rng: SmallRng,
}

impl GameState {
    /// Create a new game with the given seed.
    ///
    /// The game starts with two random tiles drawn from the configured spawn
    /// policy.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut game = GameState {
            board: Board::EMPTY,
            score: 0,
            moves: 0,
            config,
            rng: SmallRng::seed_from_u64(seed),
        };
        game.spawn();
        game.spawn();
        game
    }

    /// Start from an arbitrary board, for analysis and tests.
    pub fn from_board(board: Board, config: GameConfig, seed: u64) -> Self {
        GameState {
            board,
            score: 0,
            moves: 0,
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reset the game to initial state with a new seed.
    pub fn reset(&mut self, seed: u64) {
        *self = GameState::new(self.config, seed);
    }

    /// The state after moving toward `direction`, leaving `self` untouched.
    ///
    /// When the move changes the board, exactly one tile is spawned and the
    /// merge reward is added to the score. Otherwise the returned state equals
    /// `self`, RNG included.
    pub fn apply_move(&self, direction: Direction) -> (GameState, bool) {
        let mut next = self.clone();
        let result = next.step(direction);
        (next, result.changed)
    }

    /// Execute a move in the given direction.
    ///
    /// If the move doesn't change the board, no tile is spawned.
    pub fn step(&mut self, direction: Direction) -> StepResult {
        let slide = self.board.slide(direction);
        if slide.changed {
            self.board = slide.board;
            self.score += slide.reward;
            self.moves += 1;
            self.spawn();
        }

        StepResult {
            changed: slide.changed,
            reward: if slide.changed { slide.reward } else { 0 },
            done: self.is_terminal(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Number of accepted (board-changing) moves.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn max_tile(&self) -> u32 {
        self.board.max_tile()
    }

    pub fn empty_count(&self) -> usize {
        self.board.empty_count()
    }

    /// No move can change the board. Independent of the target tile.
    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    /// The configured target tile is on the board.
    pub fn has_won(&self) -> bool {
        self.max_tile() >= self.config.target
    }

    /// Which moves would change the board, in [`Direction::ALL`] order.
    pub fn legal_moves(&self) -> [bool; 4] {
        Direction::ALL.map(|d| self.board.can_slide(d))
    }

    fn spawn(&mut self) {
        if let Some((board, _)) = spawn_tile(&self.board, self.config.spawn, &mut self.rng) {
            self.board = board;
        }
    }
}

/// Start a game with two random tiles.
pub fn new_game(config: GameConfig, seed: u64) -> GameState {
    GameState::new(config, seed)
}

/// See [`GameState::apply_move`].
pub fn apply_move(state: &GameState, direction: Direction) -> (GameState, bool) {
    state.apply_move(direction)
}

pub fn is_terminal(state: &GameState) -> bool {
    state.is_terminal()
}

pub fn max_tile(state: &GameState) -> u32 {
    state.max_tile()
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("score", &self.score)
            .field("moves", &self.moves)
            .field("board", &self.board)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        write!(f, "{}", self.board)
    }
}
