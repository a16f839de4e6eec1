//! # Groundwater Corpus CLI (`gwc`)
//!
//! The `gwc` binary runs the batch pipeline over a directory of published
//! groundwater assessment workbooks.
//!
//! ## Usage
//!
//! ```bash
//! gwc --config ./config/gwc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gwc extract` | Decode workbooks into `records/` and `all_reports_master.json` |
//! | `gwc facts` | Derive `unified_dataset.jsonl` from the records |
//! | `gwc chunks` | Derive `semantic_chunks.jsonl` from the records |
//! | `gwc run` | `extract`, `facts` and `chunks` in order |
//! | `gwc stats` | Per-source-type counts of the outputs |
//! | `gwc search "<query>"` | Rank chunks by embedding similarity |
//! | `gwc config-example` | Print a complete example configuration |
//!
//! Logging goes to stderr via `tracing`; set `RUST_LOG=info` (or `debug`)
//! for per-file and per-sheet detail.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use groundwater_core::models::SourceType;
use tracing_subscriber::prelude::*;

use groundwater_corpus::config;
use groundwater_corpus::pipeline;
use groundwater_corpus::progress::ProgressMode;
use groundwater_corpus::search::{self, SearchFilter};
use groundwater_corpus::stats;

/// Groundwater Corpus CLI: turns groundwater assessment workbooks into
/// canonical records, metric facts and retrieval chunks.
///
/// All commands except `config-example` read a TOML configuration file
/// given by `--config`. See `config/gwc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "gwc",
    about = "Groundwater Corpus: workbook ETL for groundwater assessment reports",
    version,
    long_about = "Decodes published groundwater assessment workbooks (state reports, central \
    reports, annexures and attribute reports) into canonical JSON records, then derives a \
    metric-fact corpus and a semantic-chunk corpus for retrieval."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/gwc.toml`. Relative paths inside the file are
    /// resolved against the file's directory.
    #[arg(long, global = true, default_value = "./config/gwc.toml")]
    config: PathBuf,

    /// Progress reporting on stderr: auto, human, json, or off.
    ///
    /// `auto` shows human-readable progress when stderr is a terminal.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Decode every workbook into intermediate records.
    ///
    /// Writes `records/<source_type>/<stem>.json` per decoded sheet and the
    /// aggregate `all_reports_master.json`. Unreadable workbooks and missing
    /// required sheets are reported in the summary; the run continues.
    Extract,

    /// Derive the metric-fact corpus (`unified_dataset.jsonl`).
    ///
    /// Reads the intermediate records only, so it runs without the workbooks.
    Facts,

    /// Derive the semantic-chunk corpus (`semantic_chunks.jsonl`).
    ///
    /// Reads the intermediate records only, so it runs without the workbooks.
    Chunks,

    /// Run extract, facts and chunks in order.
    Run,

    /// Show record, fact and chunk counts per source type.
    Stats,

    /// Rank chunks by embedding similarity to a query.
    ///
    /// Embeds the chunk corpus and the query with the configured provider
    /// and searches an in-memory vector store.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Only consider chunks of this state.
        #[arg(long)]
        state: Option<String>,

        /// Only consider chunks of this source type (e.g. `annexure_2`).
        #[arg(long)]
        source_type: Option<String>,
    },

    /// Print a complete example configuration to stdout.
    ConfigExample,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::ConfigExample = cli.command {
        print!("{}", config::EXAMPLE_CONFIG);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let progress_mode = ProgressMode::from_flag(&cli.progress)?;
    let progress = progress_mode.reporter();

    match cli.command {
        Commands::Extract => {
            let summary = pipeline::run_extract(&cfg, progress.as_ref())?;
            println!("{}", summary);
        }
        Commands::Facts => {
            let summary = pipeline::run_facts(&cfg, progress.as_ref())?;
            println!("{}", summary);
        }
        Commands::Chunks => {
            let summary = pipeline::run_chunks(&cfg, progress.as_ref())?;
            println!("{}", summary);
        }
        Commands::Run => {
            let extract = pipeline::run_extract(&cfg, progress.as_ref())?;
            println!("{}", extract);
            let facts = pipeline::run_facts(&cfg, progress.as_ref())?;
            println!("{}", facts);
            let chunks = pipeline::run_chunks(&cfg, progress.as_ref())?;
            println!("{}", chunks);
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Search {
            query,
            limit,
            state,
            source_type,
        } => {
            let source_type = match source_type {
                Some(s) => Some(SourceType::parse(&s).ok_or_else(|| {
                    anyhow::anyhow!("Unknown source type: '{}'", s)
                })?),
                None => None,
            };
            let filter = SearchFilter { state, source_type };
            search::run_search(&cfg, &query, limit, &filter, progress.as_ref()).await?;
        }
        Commands::ConfigExample => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
