//! Headless runner for the Tribeworld simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tw",
    about = "Tribeworld: tribes, beasts and berries on a wrapping map",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a fresh world and run it for a number of world hours
    Simulate {
        /// World hours to simulate
        #[arg(long, default_value = "24")]
        hours: f64,

        /// RNG seed (overrides the configuration file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON configuration file (missing fields take their defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show every notification, not just the notable ones
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default configuration as JSON
    Config {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            hours,
            seed,
            config,
            verbose,
        } => commands::simulate::run(config.as_deref(), hours, seed, verbose),
        Commands::Config { output } => commands::config::run(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
