//! # 2048 engine and automated players
//!
//! A plain-array implementation of the 2048 rules with a seedable tile
//! stream, plus three move-selection strategies:
//!
//! - a one-ply positional heuristic ([`strategy::HeuristicStrategy`]),
//! - a depth-limited expectimax search ([`strategy::ExpectimaxStrategy`]),
//! - a right/down alternation baseline ([`strategy::CornerStrategy`]).
//!
//! All settings travel in explicit [`config`] values; nothing is global.
//!
//! ## Example
//!
//! ```rust
//! use twenty48_core::config::GameConfig;
//! use twenty48_core::game::new_game;
//! use twenty48_core::strategy::{ExpectimaxStrategy, Strategy};
//!
//! let mut game = new_game(GameConfig::default(), 42);
//! let mut player = ExpectimaxStrategy::default();
//! while !game.is_terminal() && game.moves() < 5 {
//!     let dir = player.choose_move(&game);
//!     game.step(dir);
//! }
//! println!("Score: {}, Max tile: {}", game.score(), game.max_tile());
//! ```

pub mod board;
pub mod config;
pub mod game;
pub mod play;
pub mod spawn;
pub mod strategy;

pub use board::{Board, Direction, Slide};
pub use config::{Config, ConfigError, GameConfig, SpawnPolicy, StrategyKind};
pub use game::{GameState, StepResult};
pub use strategy::Strategy;
