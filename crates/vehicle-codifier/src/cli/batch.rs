//! The `batch` command: codify every row of a JSON/JSONL input file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use vehicle_codifier_core::{CandidateIndexCache, Config, MatchResult, Orchestrator};

use super::{build_embedding_provider, build_llm_provider, load_catalog};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BatchFormat {
    Json,
    Jsonl,
}

/// Arguments for the `batch` command.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input file: a JSON object of `{row_id -> record}`, or JSONL with one
    /// record per line (row ids assigned by line number)
    pub input: PathBuf,

    /// Catalog CSV file (cvegs,marca,submarca,tipveh,modelo,descveh)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: BatchFormat,

    /// Include the diagnostics block on every result
    #[arg(long)]
    pub debug: bool,
}

pub async fn execute(args: BatchArgs) -> anyhow::Result<()> {
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

    let input = read_input(&args.input)?;
    let rows = input.as_object().map(|o| o.len()).unwrap_or(0);
    tracing::info!("Loaded {rows} rows from {:?}", args.input);

    let progress = create_progress_bar(rows as u64);
    let start_time = std::time::Instant::now();

    // match_batch runs the preprocessor once across the whole input and
    // then drives every row through the pipeline; we re-run it here one
    // row at a time so the progress bar can advance per-row instead of
    // reporting all-or-nothing.
    let preprocessed = vehicle_codifier_core::Preprocessor::new(&config)
        .process(&input, llm.as_deref())
        .await?;

    let mut results: HashMap<String, MatchResult> = HashMap::with_capacity(preprocessed.len());
    for (row_id, row) in preprocessed {
        let result = orchestrator.match_vehicle(row.year, &row.description).await;
        progress.inc(1);
        results.insert(row_id, result);
    }
    progress.finish_and_clear();

    write_output(&args, &results)?;

    let elapsed = start_time.elapsed();
    eprintln!(
        "Matched {} of {} rows in {:.1}s",
        results.len(),
        rows,
        elapsed.as_secs_f64()
    );

    Ok(())
}

fn read_input(path: &std::path::Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
        let mut object = serde_json::Map::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)?;
            object.insert(i.to_string(), value);
        }
        Ok(Value::Object(object))
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

fn write_output(args: &BatchArgs, results: &HashMap<String, MatchResult>) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };

    match args.format {
        BatchFormat::Json => {
            let json = serde_json::to_string_pretty(results)?;
            writeln!(writer, "{json}")?;
        }
        BatchFormat::Jsonl => {
            let mut rows: Vec<(&String, &MatchResult)> = results.iter().collect();
            rows.sort_by_key(|(id, _)| (*id).clone());
            for (row_id, result) in rows {
                let mut record = serde_json::to_value(result)?;
                if let Value::Object(map) = &mut record {
                    map.insert("row_id".to_string(), Value::String(row_id.clone()));
                }
                writeln!(writer, "{}", serde_json::to_string(&record)?)?;
            }
        }
    }

    Ok(())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("matching...");
    pb
}
