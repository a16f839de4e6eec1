//! Corpus statistics.
//!
//! Summarises what the last run produced: record, fact and chunk counts per
//! source type plus file sizes and the master document's generation time.
//! Used by `gwc stats` to give confidence that extraction and derivation
//! worked as expected.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::output::{self, OutputLayout};

/// Per-source-type counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub records: usize,
    pub facts: usize,
    pub chunks: usize,
}

/// Everything `gwc stats` prints.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    pub documents: usize,
    pub by_type: BTreeMap<String, TypeCounts>,
    pub facts_bytes: Option<u64>,
    pub chunks_bytes: Option<u64>,
    pub generated_at: Option<String>,
}

impl CorpusStats {
    pub fn totals(&self) -> TypeCounts {
        self.by_type.values().fold(TypeCounts::default(), |mut acc, c| {
            acc.records += c.records;
            acc.facts += c.facts;
            acc.chunks += c.chunks;
            acc
        })
    }
}

/// Gather statistics from the output directory. Missing outputs count as empty.
pub fn collect_stats(layout: &OutputLayout) -> Result<CorpusStats> {
    let mut stats = CorpusStats::default();

    if layout.records_dir().exists() {
        let docs = output::load_documents(layout)?;
        stats.documents = docs.len();
        for doc in &docs {
            stats
                .by_type
                .entry(doc.source_type().as_str().to_string())
                .or_default()
                .records += doc.records.len();
        }
    }

    let facts_path = layout.facts_path();
    if facts_path.exists() {
        stats.facts_bytes = file_size(&facts_path);
        for (source_type, n) in output::count_by_source_type(&output::read_jsonl(&facts_path)?) {
            stats.by_type.entry(source_type).or_default().facts += n;
        }
    }

    let chunks_path = layout.chunks_path();
    if chunks_path.exists() {
        stats.chunks_bytes = file_size(&chunks_path);
        for (source_type, n) in output::count_by_source_type(&output::read_jsonl(&chunks_path)?) {
            stats.by_type.entry(source_type).or_default().chunks += n;
        }
    }

    let master_path = layout.master_path();
    if master_path.exists() {
        let content = std::fs::read_to_string(&master_path)?;
        let master: serde_json::Value = serde_json::from_str(&content)?;
        stats.generated_at = master["metadata"]["generated_at"]
            .as_str()
            .map(|s| s.to_string());
    }

    Ok(stats)
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).map(|m| m.len()).ok()
}

/// Run the stats command: read the outputs and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let layout = OutputLayout::new(&config.paths.output_dir);
    let stats = collect_stats(&layout)?;
    let totals = stats.totals();

    println!("Groundwater Corpus: Output Stats");
    println!("================================");
    println!();
    println!("  Output dir:  {}", layout.root().display());
    println!(
        "  Generated:   {}",
        stats
            .generated_at
            .as_deref()
            .map(format_generated)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    println!("  Documents:   {}", stats.documents);
    println!("  Records:     {}", totals.records);
    println!(
        "  Facts:       {}{}",
        totals.facts,
        stats
            .facts_bytes
            .map(|b| format!(" ({})", format_bytes(b)))
            .unwrap_or_default()
    );
    println!(
        "  Chunks:      {}{}",
        totals.chunks,
        stats
            .chunks_bytes
            .map(|b| format!(" ({})", format_bytes(b)))
            .unwrap_or_default()
    );

    if !stats.by_type.is_empty() {
        println!();
        println!("  By source type:");
        println!(
            "  {:<20} {:>8} {:>8} {:>8}",
            "SOURCE TYPE", "RECORDS", "FACTS", "CHUNKS"
        );
        println!("  {}", "-".repeat(47));
        for (source_type, c) in &stats.by_type {
            println!(
                "  {:<20} {:>8} {:>8} {:>8}",
                source_type, c.records, c.facts, c.chunks
            );
        }
    }

    println!();
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// `generated_at` as `2024-03-01 10:15 UTC (3 hours ago)`; unparseable
/// values are shown as stored.
fn format_generated(ts: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => {
            let dt = dt.with_timezone(&chrono::Utc);
            format!(
                "{} ({})",
                dt.format("%Y-%m-%d %H:%M UTC"),
                age(chrono::Utc::now() - dt)
            )
        }
        Err(_) => ts.to_string(),
    }
}

fn age(elapsed: chrono::Duration) -> String {
    let plural = |n: i64, unit: &str| format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" });
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        plural(elapsed.num_minutes(), "min")
    } else if elapsed.num_days() < 1 {
        plural(elapsed.num_hours(), "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}
