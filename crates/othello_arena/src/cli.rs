//! Command-line interface for othello_arena.

use clap::{Parser, Subcommand, ValueEnum};
use strictly_othello::{NaiveStrategy, SmartStrategy, Strategy};

/// Othello Arena - authoritative multiplayer Othello server
#[derive(Parser, Debug)]
#[command(name = "othello_arena")]
#[command(about = "Multiplayer Othello match server and bots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the match server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Name announced to clients (overrides config)
        #[arg(long)]
        name: Option<String>,

        /// Drop connections silent for this many seconds (overrides config)
        #[arg(long)]
        idle_timeout: Option<u64>,
    },

    /// Connect to a server and play automatically
    Bot {
        /// Server address
        #[arg(long, default_value = "127.0.0.1:4444")]
        server: String,

        /// Name to log in with
        #[arg(short, long)]
        name: String,

        /// Move selection strategy
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Smart)]
        strategy: StrategyKind,

        /// Number of games to play before exiting
        #[arg(short, long, default_value_t = 1)]
        games: usize,
    },
}

/// Selectable bot strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Random legal moves
    Naive,
    /// One-ply heuristic search
    Smart,
}

impl StrategyKind {
    /// Instantiates the strategy.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Naive => Box::new(NaiveStrategy),
            StrategyKind::Smart => Box::new(SmartStrategy),
        }
    }
}
