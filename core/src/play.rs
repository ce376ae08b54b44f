//! Driving a strategy through whole games.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Direction};
use crate::config::{Config, GameConfig};
use crate::game::GameState;
use crate::strategy::{self, Strategy};

/// When to stop a game that is neither lost nor won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayLimits {
    /// Accepted moves before giving up (0 = unlimited).
    pub max_moves: u32,
    /// Consecutive no-op choices before giving up.
    pub max_stalls: u32,
    /// Log progress every this many accepted moves (0 = never).
    pub progress_every: u32,
}

impl Default for PlayLimits {
    fn default() -> Self {
        Self {
            max_moves: 10_000,
            max_stalls: 4,
            progress_every: 100,
        }
    }
}

/// How a single game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameReport {
    pub seed: u64,
    pub moves: u32,
    pub score: u64,
    pub max_tile: u32,
    /// The target tile was reached.
    pub won: bool,
    /// No move was left.
    pub terminal: bool,
    pub board: Board,
}

/// Play one game from a fresh start with `seed`.
pub fn play_game(
    strategy: &mut dyn Strategy,
    config: &GameConfig,
    seed: u64,
    limits: &PlayLimits,
) -> GameReport {
    let state = GameState::new(*config, seed);
    play_from(strategy, state, seed, limits, |_, _| {})
}

/// Play `state` to the end, calling `on_move` after every accepted move.
///
/// Stops when the board is terminal, when the target is reached (unless the
/// game is unlimited), or when `limits` run out.
pub fn play_from<F>(
    strategy: &mut dyn Strategy,
    mut state: GameState,
    seed: u64,
    limits: &PlayLimits,
    mut on_move: F,
) -> GameReport
where
    F: FnMut(&GameState, Direction),
{
    let unlimited = state.config().unlimited;
    let mut stalls = 0;

    while !state.is_terminal()
        && (unlimited || !state.has_won())
        && (limits.max_moves == 0 || state.moves() < limits.max_moves)
    {
        let dir = strategy.choose_move(&state);
        let result = state.step(dir);
        if !result.changed {
            stalls += 1;
            if stalls >= limits.max_stalls.max(1) {
                warn!(
                    "{} stalled {} times in a row at move {}, abandoning game {}",
                    strategy.name(),
                    stalls,
                    state.moves(),
                    seed
                );
                break;
            }
            continue;
        }
        stalls = 0;
        on_move(&state, dir);

        if limits.progress_every > 0 && state.moves() % limits.progress_every == 0 {
            info!(
                "game {}: moves={} score={} max_tile={}",
                seed,
                state.moves(),
                state.score(),
                state.max_tile()
            );
        }
    }

    let report = GameReport {
        seed,
        moves: state.moves(),
        score: state.score(),
        max_tile: state.max_tile(),
        won: state.has_won(),
        terminal: state.is_terminal(),
        board: *state.board(),
    };
    info!(
        "game {} over: moves={} score={} max_tile={} won={}",
        seed, report.moves, report.score, report.max_tile, report.won
    );
    report
}

/// Aggregate results of a batch of games.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub strategy: String,
    pub games: u32,
    pub wins: u32,
    pub success_rate: f64,
    pub average_score: f64,
    pub median_score: f64,
    pub min_score: u64,
    pub max_score: u64,
    pub average_max_tile: f64,
    pub best_tile: u32,
    /// Max tile reached -> number of games.
    pub tile_distribution: BTreeMap<u32, u32>,
}

impl TrialSummary {
    pub fn from_reports(strategy: &str, reports: &[GameReport]) -> Self {
        let games = reports.len() as u32;
        let n = reports.len().max(1) as f64;

        let mut scores: Vec<u64> = reports.iter().map(|r| r.score).collect();
        scores.sort_unstable();
        let median_score = match scores.len() {
            0 => 0.0,
            len if len % 2 == 0 => (scores[len / 2 - 1] + scores[len / 2]) as f64 / 2.0,
            len => scores[len / 2] as f64,
        };

        let mut tile_distribution = BTreeMap::new();
        for report in reports {
            *tile_distribution.entry(report.max_tile).or_insert(0) += 1;
        }

        let wins = reports.iter().filter(|r| r.won).count() as u32;
        TrialSummary {
            strategy: strategy.to_string(),
            games,
            wins,
            success_rate: f64::from(wins) / n,
            average_score: scores.iter().sum::<u64>() as f64 / n,
            median_score,
            min_score: scores.first().copied().unwrap_or(0),
            max_score: scores.last().copied().unwrap_or(0),
            average_max_tile: reports.iter().map(|r| f64::from(r.max_tile)).sum::<f64>() / n,
            best_tile: reports.iter().map(|r| r.max_tile).max().unwrap_or(0),
            tile_distribution,
        }
    }
}

/// Play `games` games with seeds `base_seed`, `base_seed + 1`, ... using a
/// fresh strategy built from `config` for each.
pub fn run_trials(
    config: &Config,
    games: u32,
    base_seed: u64,
    limits: &PlayLimits,
) -> TrialSummary {
    let name = strategy::build(config).name();
    let mut reports = Vec::with_capacity(games as usize);
    for i in 0..games {
        let mut player = strategy::build(config);
        let seed = base_seed.wrapping_add(u64::from(i));
        let report = play_game(player.as_mut(), &config.game, seed, limits);
        reports.push(report);
        info!(
            "{}: {}/{} games won",
            name,
            reports.iter().filter(|r| r.won).count(),
            i + 1
        );
    }
    TrialSummary::from_reports(name, &reports)
}
