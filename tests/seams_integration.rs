//! Library-level tests for the embedding and vector store seams.
//!
//! These run the pipeline in-process over a synthesised workbook, then feed
//! the chunk corpus through a custom [`EmbeddingProvider`] and both the
//! built-in [`InMemoryStore`] and a custom [`VectorStore`].

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use groundwater_core::chunks::Chunk;
use groundwater_core::embedding::{cosine_similarity, EmbeddingProvider};
use groundwater_core::store::memory::InMemoryStore;
use groundwater_core::store::{Hit, VectorStore};
use groundwater_corpus::config::parse_config;
use groundwater_corpus::output::OutputLayout;
use groundwater_corpus::pipeline::{run_chunks, run_extract};
use groundwater_corpus::progress::NoProgress;
use groundwater_corpus::search::{load_chunks, rank_chunks};
use tempfile::TempDir;

// ─── Test Provider ──────────────────────────────────────────────────

/// Counts occurrences of a fixed vocabulary of place names.
struct PlaceProvider;

const VOCAB: [&str; 4] = ["punjab", "kerala", "ludhiana", "idukki"];

#[async_trait]
impl EmbeddingProvider for PlaceProvider {
    fn model_name(&self) -> &str {
        "places"
    }

    fn dims(&self) -> usize {
        VOCAB.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                VOCAB
                    .iter()
                    .map(|w| lower.matches(w).count() as f32)
                    .collect()
            })
            .collect())
    }
}

// ─── Test Store ─────────────────────────────────────────────────────

/// A store that records upserted ids and answers queries linearly.
#[derive(Default)]
struct RecordingStore {
    upserts: Mutex<Vec<String>>,
    entries: Mutex<Vec<(String, Vec<f32>, Chunk)>>,
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn upsert(&self, id: &str, vector: Vec<f32>, chunk: Chunk) -> Result<()> {
        self.upserts.lock().unwrap().push(id.to_string());
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|(existing, _, _)| existing != id);
        entries.push((id.to_string(), vector, chunk));
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>> {
        let entries = self.entries.lock().unwrap();
        let mut hits: Vec<Hit> = entries
            .iter()
            .map(|(id, v, chunk)| Hit {
                id: id.clone(),
                score: cosine_similarity(vector, v),
                chunk: chunk.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.lock().unwrap().len())
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn inline_row(r: usize, cells: &[&str]) -> String {
    let mut xml = format!(r#"<row r="{}">"#, r);
    for (c, value) in cells.iter().enumerate() {
        let cell_ref = format!("{}{}", (b'A' + c as u8) as char, r);
        if value.parse::<f64>().is_ok() {
            xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
        } else {
            xml.push_str(&format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                cell_ref, value
            ));
        }
    }
    xml.push_str("</row>");
    xml
}

fn write_annexure2(path: &Path) {
    let rows = [
        inline_row(1, &["DYNAMIC GROUND WATER RESOURCES OF INDIA - 2023"]),
        inline_row(2, &["KERALA"]),
        inline_row(3, &["1", "Idukki", "1200", "300", "400", "100", "2000", "200", "1800", "500", "20", "300", "820", "310", "980", "45.5"]),
        inline_row(4, &["DYNAMIC GROUND WATER RESOURCES OF INDIA - 2023"]),
        inline_row(5, &["PUNJAB"]),
        inline_row(6, &["1", "Ludhiana", "5000", "900", "800", "600", "7300", "700", "6600", "9000", "150", "400", "9550", "420", "10", "144.7"]),
    ];
    let sheet = format!(
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows.concat()
    );
    let workbook = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Annexure II" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    let rels = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    let opts = zip::write::SimpleFileOptions::default();
    for (name, body) in [
        ("xl/workbook.xml", workbook.to_string()),
        ("xl/_rels/workbook.xml.rels", rels.to_string()),
        ("xl/worksheets/sheet1.xml", sheet),
    ] {
        zip.start_file(name, opts).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Extract and chunk one annexure 2 workbook; returns the chunk corpus.
fn build_corpus(tmp: &TempDir) -> Vec<Chunk> {
    let data_dir = tmp.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    write_annexure2(&data_dir.join("Annexure2_2022-23.xlsx"));

    let config = parse_config(&format!(
        "[paths]\ndata_dir = {:?}\noutput_dir = {:?}\n",
        data_dir.display().to_string(),
        tmp.path().join("output").display().to_string()
    ))
    .unwrap();

    let summary = run_extract(&config, &NoProgress).unwrap();
    assert_eq!(summary.total_records(), 2);
    assert!(summary.failures.is_empty());
    run_chunks(&config, &NoProgress).unwrap();

    let layout = OutputLayout::new(&config.paths.output_dir);
    load_chunks(&layout.chunks_path()).unwrap()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_ranks_matching_district_first() {
    let tmp = TempDir::new().unwrap();
    let chunks = build_corpus(&tmp);
    assert_eq!(chunks.len(), 2);

    let hits = rank_chunks(&PlaceProvider, chunks, "Ludhiana", 2, 1, &NoProgress)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.district.as_deref(), Some("Ludhiana"));
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn test_chunk_ids_are_stable_store_keys() {
    let tmp = TempDir::new().unwrap();
    let chunks = build_corpus(&tmp);

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = PlaceProvider.embed(&texts).await.unwrap();

    let store = InMemoryStore::new();
    for _ in 0..2 {
        for (chunk, vector) in chunks.iter().zip(&vectors) {
            store.upsert(&chunk.id, vector.clone(), chunk.clone()).await.unwrap();
        }
    }
    // re-upserting the same corpus replaces entries
    assert_eq!(store.len().await.unwrap(), chunks.len());

    // a second run over the same workbook yields the same ids
    let again = build_corpus(&TempDir::new().unwrap());
    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    let ids_again: Vec<&str> = again.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ids_again);
}

#[tokio::test]
async fn test_custom_store_behind_trait_object() {
    let tmp = TempDir::new().unwrap();
    let chunks = build_corpus(&tmp);

    let recording = RecordingStore::default();
    let store: &dyn VectorStore = &recording;
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = PlaceProvider.embed(&texts).await.unwrap();
    for (chunk, vector) in chunks.iter().zip(vectors) {
        store.upsert(&chunk.id, vector, chunk.clone()).await.unwrap();
    }

    let query = PlaceProvider.embed(&["idukki".to_string()]).await.unwrap();
    let hits = store.query(&query[0], 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.district.as_deref(), Some("Idukki"));

    let upserts = recording.upserts.lock().unwrap().clone();
    let expected: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
    assert_eq!(upserts, expected);
}
