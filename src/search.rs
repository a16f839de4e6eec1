//! Semantic search over the chunk corpus.
//!
//! `gwc search` loads `semantic_chunks.jsonl`, embeds every chunk and the
//! query through the configured [`EmbeddingProvider`], upserts the chunks
//! into an [`InMemoryStore`] keyed by chunk id and prints the top hits by
//! cosine similarity.

use std::path::Path;

use anyhow::{Context, Result};
use groundwater_core::chunks::Chunk;
use groundwater_core::embedding::EmbeddingProvider;
use groundwater_core::models::SourceType;
use groundwater_core::store::memory::InMemoryStore;
use groundwater_core::store::{Hit, VectorStore};
use tracing::info;

use crate::config::Config;
use crate::embedding::{create_provider, embed_query};
use crate::output::OutputLayout;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Narrowing applied before embedding.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive state name.
    pub state: Option<String>,
    pub source_type: Option<SourceType>,
}

impl SearchFilter {
    fn matches(&self, chunk: &Chunk) -> bool {
        if let Some(state) = &self.state {
            if !chunk.state.eq_ignore_ascii_case(state.trim()) {
                return false;
            }
        }
        if let Some(source_type) = self.source_type {
            if chunk.source_type != source_type {
                return false;
            }
        }
        true
    }
}

/// Read `semantic_chunks.jsonl`.
pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read {}. Run `gwc chunks` first.",
            path.display()
        )
    })?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid chunk", path.display(), i + 1))
        })
        .collect()
}

/// Embed `chunks` in batches, store them, and return the `limit` best hits
/// for `query`.
pub async fn rank_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: Vec<Chunk>,
    query: &str,
    limit: usize,
    batch_size: usize,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Hit>> {
    let store = InMemoryStore::new();
    let total = chunks.len() as u64;
    let mut done = 0u64;

    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = provider.embed(&texts).await?;
        if vectors.len() != batch.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            );
        }
        for (chunk, vector) in batch.iter().zip(vectors) {
            store.upsert(&chunk.id, vector, chunk.clone()).await?;
        }
        done += batch.len() as u64;
        progress.report(ProgressEvent::Embedding { n: done, total });
    }
    let stored = store.len().await?;
    info!(chunks = stored, model = provider.model_name(), "embedded chunk corpus");

    let query_vec = embed_query(provider, query).await?;
    store.query(&query_vec, limit).await
}

/// `gwc search`: embed the chunk corpus and print the best matches.
pub async fn run_search(
    config: &Config,
    query: &str,
    limit: usize,
    filter: &SearchFilter,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        anyhow::bail!(
            "Semantic search requires an embedding provider. Set [embedding].provider = \"ollama\" with model and dims."
        );
    }
    let provider = create_provider(&config.embedding)?;

    let layout = OutputLayout::new(&config.paths.output_dir);
    let chunks: Vec<Chunk> = load_chunks(&layout.chunks_path())?
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect();

    if chunks.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let hits = rank_chunks(
        provider.as_ref(),
        chunks,
        query,
        limit,
        config.embedding.batch_size,
        progress,
    )
    .await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}", format_hit(i + 1, hit));
        println!();
    }
    Ok(())
}

fn format_hit(rank: usize, hit: &Hit) -> String {
    let c = &hit.chunk;
    let mut place = c.state.clone();
    if let Some(district) = &c.district {
        place = format!("{} / {}", place, district);
    }
    if let Some(block) = &c.block {
        place = format!("{} / {}", place, block);
    }
    let mut excerpt: String = c.text.replace('\n', " ").trim().chars().take(240).collect();
    if c.text.chars().count() > 240 {
        excerpt.push_str("...");
    }

    let mut out = format!("{}. [{:.2}] {} ({})\n", rank, hit.score, place, c.year);
    out.push_str(&format!("    source: {} / {}\n", c.source_type, c.source));
    if let Some(cat) = &c.categorization {
        out.push_str(&format!("    categorization: {}\n", cat));
    }
    out.push_str(&format!("    excerpt: \"{}\"\n", excerpt));
    out.push_str(&format!("    id: {}", hit.id));
    out
}
