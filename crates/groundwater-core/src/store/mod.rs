//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the seam to a document store keyed by chunk
//! and fact identities: upsert by id, nearest-neighbour query by vector.
//! [`memory::InMemoryStore`] is the brute-force cosine fallback used when no
//! external store is available.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::chunks::Chunk;

/// A stored chunk returned from a vector query.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    /// Chunk identity.
    pub id: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
    pub chunk: Chunk,
}

/// Abstract vector store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorStore::upsert) | Insert or replace a chunk and its vector |
/// | [`query`](VectorStore::query) | Top-`k` chunks by similarity |
/// | [`len`](VectorStore::len) | Number of stored chunks |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the entry with `id`.
    async fn upsert(&self, id: &str, vector: Vec<f32>, chunk: Chunk) -> Result<()>;

    /// Return at most `k` hits, best first. Ties keep insertion order.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;
}
