//! The `match` command: codify one vehicle description.

use std::path::PathBuf;

use clap::Args;
use vehicle_codifier_core::{CandidateIndexCache, Config, Orchestrator};

use super::{build_embedding_provider, build_llm_provider, load_catalog};

/// Arguments for the `match` command.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Model year of the vehicle
    pub year: i32,

    /// Free-text vehicle description
    pub description: String,

    /// Catalog CSV file (cvegs,marca,submarca,tipveh,modelo,descveh)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Include the diagnostics block in the output
    #[arg(long)]
    pub debug: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

pub async fn execute(args: MatchArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.output.debug = config.output.debug || args.debug;

    let catalog = load_catalog(&args.catalog, config.catalog.refresh_interval_secs)?;
    let index_cache = CandidateIndexCache::new();
    let llm = build_llm_provider(&config);
    let embedder = build_embedding_provider(&config);

    let orchestrator = Orchestrator::new(
        &config,
        &catalog,
        &index_cache,
        llm.as_deref(),
        Some(embedder.as_ref()),
    );
    let result = orchestrator.match_vehicle(args.year, &args.description).await;

    let json = if args.pretty || config.output.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    Ok(())
}
