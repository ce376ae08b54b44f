//! Configuration for games, searches and the built-in players.
//!
//! Everything is plain data passed down explicitly; there is no process-wide
//! settings state. The same structure loads from YAML:
//!
//! ```yaml
//! strategy: expectimax
//! game:
//!   spawn: { kind: restricted }
//!   target: 4096
//! search:
//!   depth: 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probability that a standard spawn is a 2 rather than a 4.
pub const DEFAULT_TWO_PROBABILITY: f64 = 0.9;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("spawn probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("target tile {0} must be a power of two of at least 4")]
    InvalidTarget(u32),
}

/// Which values new tiles take.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SpawnPolicy {
    /// 2 with probability `two_probability`, otherwise 4.
    Standard {
        #[serde(default = "default_two_probability")]
        two_probability: f64,
    },
    /// Always 2.
    Restricted,
    /// A power of two between the smallest tile on the board and half the
    /// largest one, uniform over exponents.
    Adaptive,
}

fn default_two_probability() -> f64 {
    DEFAULT_TWO_PROBABILITY
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy::Standard {
            two_probability: DEFAULT_TWO_PROBABILITY,
        }
    }
}

/// Rules of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub spawn: SpawnPolicy,
    /// Tile value that counts as a win.
    pub target: u32,
    /// Keep playing after the target is reached.
    pub unlimited: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn: SpawnPolicy::default(),
            target: 2048,
            unlimited: false,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let SpawnPolicy::Standard { two_probability } = self.spawn {
            if !(0.0..=1.0).contains(&two_probability) {
                return Err(ConfigError::InvalidProbability(two_probability));
            }
        }
        if self.target < 4 || !self.target.is_power_of_two() {
            return Err(ConfigError::InvalidTarget(self.target));
        }
        Ok(())
    }
}

/// Weights of the expectimax leaf evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvalWeights {
    /// Per empty cell.
    pub empty: f64,
    /// Per monotone adjacent pair.
    pub monotonicity: f64,
    /// Scales the (non-positive) smoothness sum.
    pub smoothness: f64,
    /// Multiplies the max tile when it sits in a corner.
    pub corner: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            empty: 20.0,
            monotonicity: 1.5,
            smoothness: 0.1,
            corner: 10.0,
        }
    }
}

/// Expectimax search settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies below the root decision; 0 scores moves statically.
    pub depth: u32,
    /// Memoize node values within one decision.
    pub cache: bool,
    pub weights: EvalWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            cache: true,
            weights: EvalWeights::default(),
        }
    }
}

/// Weights of the one-ply corner heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Positional weights, highest in the top-left corner and snaking down.
    pub matrix: [[i64; 4]; 4],
    /// Multiplies the max tile when it sits in the top-left corner.
    pub corner: i64,
    /// Per empty cell.
    pub empty: i64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            matrix: [
                [15, 14, 13, 12],
                [8, 9, 10, 11],
                [7, 6, 5, 4],
                [0, 1, 2, 3],
            ],
            corner: 10,
            empty: 20,
        }
    }
}

/// The built-in move-selection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Heuristic,
    #[default]
    Expectimax,
    Corner,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub strategy: StrategyKind,
    pub game: GameConfig,
    pub search: SearchConfig,
    pub heuristic: HeuristicWeights,
}

impl Config {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()
    }
}
