//! In-memory [`VectorStore`] implementation.
//!
//! Entries live in a `Vec` (insertion order, used to break score ties)
//! with a `HashMap` from id to position, behind `std::sync::RwLock`.
//! Queries are brute-force cosine similarity over every stored vector.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::chunks::Chunk;
use crate::embedding::cosine_similarity;

use super::{Hit, VectorStore};

struct StoredVector {
    id: String,
    vector: Vec<f32>,
    chunk: Chunk,
}

#[derive(Default)]
struct Entries {
    items: Vec<StoredVector>,
    index: HashMap<String, usize>,
}

/// In-memory store; the fallback when no external store is configured.
pub struct InMemoryStore {
    entries: RwLock<Entries>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, chunk: Chunk) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = StoredVector {
            id: id.to_string(),
            vector,
            chunk,
        };
        match entries.index.get(id).copied() {
            Some(pos) => entries.items[pos] = entry,
            None => {
                let pos = entries.items.len();
                entries.index.insert(id.to_string(), pos);
                entries.items.push(entry);
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut scored: Vec<(f32, &StoredVector)> = entries
            .items
            .iter()
            .map(|sv| (cosine_similarity(vector, &sv.vector), sv))
            .collect();
        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, sv)| Hit {
                id: sv.id.clone(),
                score,
                chunk: sv.chunk.clone(),
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().unwrap_or_else(|e| e.into_inner()).items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use serde_json::Map;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            state: "Kerala".into(),
            district: None,
            block: None,
            year: "2022-2023".into(),
            source_type: SourceType::Annexure1,
            source: "Annexure1.xlsx".into(),
            categorization: None,
            watershed: None,
            text: text.to_string(),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn query_ranks_by_cosine() {
        let store = InMemoryStore::new();
        store.upsert("a", vec![1.0, 0.0], chunk("a", "east")).await.unwrap();
        store.upsert("b", vec![0.0, 1.0], chunk("b", "north")).await.unwrap();
        store.upsert("c", vec![0.7, 0.7], chunk("c", "north-east")).await.unwrap();

        let hits = store.query(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = InMemoryStore::new();
        store.upsert("a", vec![1.0, 0.0], chunk("a", "old")).await.unwrap();
        store.upsert("a", vec![0.0, 1.0], chunk("a", "new")).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        let hits = store.query(&[0.0, 1.0], 5).await.unwrap();
        assert_eq!(hits[0].chunk.text, "new");
    }

    #[tokio::test]
    async fn many_upserts_keep_positions() {
        let store = InMemoryStore::new();
        for i in 0..2000 {
            let id = format!("c{}", i);
            store.upsert(&id, vec![1.0, i as f32], chunk(&id, "v1")).await.unwrap();
        }
        // replace every other entry; positions and count are unchanged
        for i in (0..2000).step_by(2) {
            let id = format!("c{}", i);
            store.upsert(&id, vec![1.0, i as f32], chunk(&id, "v2")).await.unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 2000);

        let entries = store.entries.read().unwrap();
        assert_eq!(entries.index.len(), 2000);
        assert_eq!(entries.items[10].id, "c10");
        assert_eq!(entries.items[10].chunk.text, "v2");
        assert_eq!(entries.items[11].chunk.text, "v1");
        assert_eq!(entries.index["c1999"], 1999);
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = InMemoryStore::default();
        assert!(store.query(&[1.0], 3).await.unwrap().is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
