//! CLI demonstration harness for the vehicle CVEGS codification pipeline.
//!
//! Loads a catalog snapshot from a CSV file, loads configuration, wires up
//! HTTP-backed LLM/embedding providers, and runs single or batch matches.
//!
//! # Usage
//!
//! ```bash
//! # Codify a single description
//! vehicle-codifier match 2022 "toyota yaris sol l" --catalog catalog.csv
//!
//! # Codify a batch of rows
//! vehicle-codifier batch rows.jsonl --catalog catalog.csv --output results.jsonl
//!
//! # View configuration
//! vehicle-codifier config show
//! ```

use clap::{Parser, Subcommand};

mod catalog_source;
mod cli;
mod logging;

/// vehicle-codifier - CVEGS vehicle codification pipeline harness.
#[derive(Parser, Debug)]
#[command(name = "vehicle-codifier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Codify a single vehicle description
    Match(cli::match_cmd::MatchArgs),

    /// Codify every row of a batch input file
    Batch(cli::batch::BatchArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match vehicle_codifier_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `vehicle-codifier config path`."
            );
            vehicle_codifier_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("vehicle-codifier v{}", vehicle_codifier_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Match(args) => cli::match_cmd::execute(args).await,
        Commands::Batch(args) => cli::batch::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
