//! Voidreach CLI - generate galaxies, resolve turns and preview moves.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Voidreach - turn resolution for a grid-based space strategy game
#[derive(Parser, Debug)]
#[command(name = "voidreach")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new galaxy and write its state as JSON
    NewGame {
        /// Random seed (default: 0)
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Number of players (2-8)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Number of solar systems
        #[arg(long, default_value = "4")]
        systems: usize,

        /// Width and height of every solar system
        #[arg(long, default_value = "24")]
        size: i32,

        /// Neutral planets per solar system
        #[arg(long, default_value = "3")]
        neutral_planets: usize,

        /// Write the state here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Resolve one turn against a saved state
    Resolve {
        /// Game state file
        #[arg(long, required = true)]
        state: PathBuf,

        /// Turn document ({"actions": [...]})
        #[arg(long, required = true)]
        turn: PathBuf,

        /// Engine configuration file (default: builtin)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the new state here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Show every cell a ship can reach this turn
    Reachable {
        /// Game state file
        #[arg(long, required = true)]
        state: PathBuf,

        /// Ship ID
        #[arg(long, required = true)]
        ship: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Show the shortest route for a ship
    Route {
        /// Game state file
        #[arg(long, required = true)]
        state: PathBuf,

        /// Ship ID
        #[arg(long, required = true)]
        ship: u32,

        /// Destination x
        #[arg(short, required = true)]
        x: i32,

        /// Destination y
        #[arg(short, required = true)]
        y: i32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check a state file for consistency
    Validate {
        /// Game state file
        #[arg(required = true)]
        state: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::NewGame {
            seed,
            players,
            systems,
            size,
            neutral_planets,
            out,
        } => cli::new_game::execute(seed, players, systems, size, neutral_planets, out.as_deref()),

        Commands::Resolve {
            state,
            turn,
            config,
            out,
            format,
        } => cli::resolve::execute(&state, &turn, config.as_deref(), out.as_deref(), format),

        Commands::Reachable {
            state,
            ship,
            format,
        } => cli::preview::reachable(&state, ship, format),

        Commands::Route {
            state,
            ship,
            x,
            y,
            format,
        } => cli::preview::route(&state, ship, x, y, format),

        Commands::Validate { state } => cli::validate::execute(&state),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
