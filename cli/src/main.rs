//! # 2048 CLI
//!
//! Play 2048 in the terminal with an optional hint from an automated
//! player, or run headless trials of one of the built-in strategies.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use twenty48_core::config::{Config, SpawnPolicy, StrategyKind, DEFAULT_TWO_PROBABILITY};
use twenty48_core::play::{play_from, run_trials, PlayLimits, TrialSummary};
use twenty48_core::{strategy, Direction, GameState};

#[derive(Parser, Debug)]
#[command(name = "twenty48")]
#[command(author, version, about = "Play 2048 in the terminal or run automated players")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long, conflicts_with = "episodes")]
    interactive: bool,

    /// Number of games to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum accepted moves per game (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_moves: u32,

    /// YAML configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Automated player (headless play and interactive hints)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Expectimax search depth
    #[arg(long)]
    depth: Option<u32>,

    /// Spawn policy for new tiles
    #[arg(long, value_enum)]
    spawn: Option<SpawnArg>,

    /// Probability of a 2 under the standard spawn policy
    #[arg(long)]
    two_probability: Option<f64>,

    /// Tile value that wins the game
    #[arg(short, long)]
    target: Option<u32>,

    /// Keep playing after the target tile is reached
    #[arg(short, long)]
    unlimited: bool,

    /// Print the headless summary as JSON
    #[arg(long)]
    json: bool,

    /// Show board after each move in headless mode
    #[arg(long)]
    show_boards: bool,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Default log filter for the requested verbosity.
    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// One-ply positional weights
    Heuristic,
    /// Depth-limited expectimax search
    Expectimax,
    /// Alternate right and down
    Corner,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Heuristic => StrategyKind::Heuristic,
            StrategyArg::Expectimax => StrategyKind::Expectimax,
            StrategyArg::Corner => StrategyKind::Corner,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpawnArg {
    /// 2 or 4 (see --two-probability)
    Standard,
    /// Always 2
    Restricted,
    /// Between the smallest tile and half the largest
    Adaptive,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let config = load_config(&args)?;
    info!("config: {:?}", config);

    match args.episodes {
        Some(episodes) if !args.interactive => run_headless(&args, &config, episodes),
        _ => run_interactive(&args, &config),
    }
}

/// Merge the optional config file with command-line overrides.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(kind) = args.strategy {
        config.strategy = kind.into();
    }
    if let Some(depth) = args.depth {
        config.search.depth = depth;
    }
    match (args.spawn, args.two_probability) {
        (Some(SpawnArg::Restricted), _) => config.game.spawn = SpawnPolicy::Restricted,
        (Some(SpawnArg::Adaptive), _) => config.game.spawn = SpawnPolicy::Adaptive,
        (Some(SpawnArg::Standard), p) => {
            config.game.spawn = SpawnPolicy::Standard {
                two_probability: p.unwrap_or(DEFAULT_TWO_PROBABILITY),
            }
        }
        (None, Some(p)) => {
            config.game.spawn = SpawnPolicy::Standard { two_probability: p }
        }
        (None, None) => {}
    }
    if let Some(target) = args.target {
        config.game.target = target;
    }
    if args.unlimited {
        config.game.unlimited = true;
    }

    config.validate().context("invalid settings")?;
    Ok(config)
}

/// Run interactive mode where user plays with keyboard.
fn run_interactive(args: &Args, config: &Config) -> anyhow::Result<()> {
    // Set terminal to raw mode for single-key input
    enable_raw_mode();

    let mut game = GameState::new(config.game, args.seed);
    let mut advisor = strategy::build(config);
    let mut announced_win = false;
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    redraw(&game, config)?;

    loop {
        let Some(bytes_read) = read_key(&mut stdin, &mut buffer) else {
            disable_raw_mode();
            return Ok(());
        };

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(dir) => {
                let finished = game.is_terminal() || (announced_win && !config.game.unlimited);
                if finished {
                    continue;
                }
                let result = game.step(dir);
                redraw(&game, config)?;

                if result.reward > 0 {
                    println!("  +{} points!", result.reward);
                }
                if !result.changed {
                    println!("  Move didn't change the board");
                }

                if game.has_won() && !announced_win {
                    announced_win = true;
                    println!("\n  *** YOU WON! ***");
                    if config.game.unlimited {
                        println!("  Unlimited mode: keep going!");
                    } else {
                        println!("  Press R to restart or Q to quit");
                    }
                } else if game.is_terminal() {
                    println!("\n  *** GAME OVER ***");
                    println!("  Final Score: {}", game.score());
                    println!("  Max Tile: {}", game.max_tile());
                    println!("\n  Press R to restart or Q to quit");
                }
            }
            InputAction::Hint => {
                if !game.is_terminal() {
                    let dir = advisor.choose_move(&game);
                    println!("  {} suggests: {}", advisor.name(), dir);
                }
            }
            InputAction::Restart => {
                game.reset(args.seed);
                advisor = strategy::build(config);
                announced_win = false;
                redraw(&game, config)?;
            }
            InputAction::Quit => {
                disable_raw_mode();
                println!("\nGoodbye!");
                return Ok(());
            }
            InputAction::None => {}
        }
    }
}

/// Run headless simulation mode.
fn run_headless(args: &Args, config: &Config, episodes: u32) -> anyhow::Result<()> {
    let limits = PlayLimits {
        max_moves: args.max_moves,
        ..PlayLimits::default()
    };

    let summary = if args.show_boards {
        let mut reports = Vec::with_capacity(episodes as usize);
        let mut name = "";
        for episode in 0..episodes {
            let seed = args.seed.wrapping_add(u64::from(episode));
            let mut player = strategy::build(config);
            name = player.name();
            let game = GameState::new(config.game, seed);
            let report = play_from(player.as_mut(), game, seed, &limits, |state, dir| {
                println!("Episode {} Step {}: {}", episode + 1, state.moves(), dir);
                print!("{}", state);
            });
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}, Won={}",
                episode + 1,
                report.score,
                report.max_tile,
                report.moves,
                report.won
            );
            reports.push(report);
        }
        TrialSummary::from_reports(name, &reports)
    } else {
        run_trials(config, episodes, args.seed, &limits)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(args, config, &summary);
    }
    Ok(())
}

/// Output results in parseable format.
fn print_summary(args: &Args, config: &Config, summary: &TrialSummary) {
    println!("=== Simulation Results ===");
    println!("episodes={}", summary.games);
    println!("strategy={}", summary.strategy);
    println!("seed={}", args.seed);
    println!("max_moves={}", args.max_moves);
    println!("target={}", config.game.target);
    println!("wins={}", summary.wins);
    println!("success_rate={:.3}", summary.success_rate);
    println!("avg_score={:.2}", summary.average_score);
    println!("median_score={:.2}", summary.median_score);
    println!("min_score={}", summary.min_score);
    println!("max_score={}", summary.max_score);
    println!("avg_max_tile={:.0}", summary.average_max_tile);
    println!("max_tile_overall={}", summary.best_tile);

    let distribution: Vec<String> = summary
        .tile_distribution
        .iter()
        .map(|(tile, count)| format!("{}:{}", tile, count))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
}

/// Read one key press; `None` once the input is closed or broken.
fn read_key<R: Read>(input: &mut R, buffer: &mut [u8; 3]) -> Option<usize> {
    match input.read(buffer) {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

enum InputAction {
    Move(Direction),
    Hint,
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(Direction::Up),
        [b's'] | [b'S'] => InputAction::Move(Direction::Down),
        [b'a'] | [b'A'] => InputAction::Move(Direction::Left),
        [b'd'] | [b'D'] => InputAction::Move(Direction::Right),

        // Control keys
        [b'h'] | [b'H'] => InputAction::Hint,
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

fn redraw(game: &GameState, config: &Config) -> io::Result<()> {
    println!("\x1b[2J\x1b[H"); // Clear screen
    println!("=== 2048 === target {}", config.game.target);
    println!("Controls: WASD or Arrow Keys | H for a hint | Q to quit | R to restart\n");
    print!("{}", game);
    io::stdout().flush()
}

// Platform-specific terminal raw mode handling
#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // Without raw mode each key needs Enter.
}

#[cfg(not(unix))]
fn disable_raw_mode() {}
