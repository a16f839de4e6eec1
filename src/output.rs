//! Output files: intermediate per-source JSON, the master document and the
//! two JSONL corpora.
//!
//! ```text
//! <output_dir>/
//! ├── records/<source_type>/<stem>.json
//! ├── all_reports_master.json
//! ├── unified_dataset.jsonl
//! └── semantic_chunks.jsonl
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use groundwater_core::models::{SourceDocument, SourceType};
use serde::Serialize;
use serde_json::{json, Map, Value};
use walkdir::WalkDir;

pub const RECORDS_DIR: &str = "records";
pub const MASTER_FILE: &str = "all_reports_master.json";
pub const FACTS_FILE: &str = "unified_dataset.jsonl";
pub const CHUNKS_FILE: &str = "semantic_chunks.jsonl";

/// Paths below the configured output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    pub fn document_path(&self, source_type: SourceType, stem: &str) -> PathBuf {
        self.records_dir()
            .join(source_type.as_str())
            .join(format!("{}.json", stem))
    }

    pub fn master_path(&self) -> PathBuf {
        self.root.join(MASTER_FILE)
    }

    pub fn facts_path(&self) -> PathBuf {
        self.root.join(FACTS_FILE)
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.root.join(CHUNKS_FILE)
    }

    /// Drop intermediate files of a previous run.
    pub fn reset_records(&self) -> Result<()> {
        let dir = self.records_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear {}", dir.display()))?;
        }
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(())
    }
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Write one decoded source to `records/<source_type>/<stem>.json`.
pub fn write_document(layout: &OutputLayout, doc: &SourceDocument, stem: &str) -> Result<PathBuf> {
    let path = layout.document_path(doc.source_type(), stem);
    write_json_file(&path, doc)?;
    Ok(path)
}

/// Load every intermediate document, ordered by path.
pub fn load_documents(layout: &OutputLayout) -> Result<Vec<SourceDocument>> {
    let dir = layout.records_dir();
    if !dir.exists() {
        anyhow::bail!(
            "No intermediate records at {}. Run `gwc extract` first.",
            dir.display()
        );
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(&dir) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "json") {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        let doc: SourceDocument = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Build the aggregate master document.
pub fn master_document(docs: &[SourceDocument], generated_at: &str) -> Value {
    let mut years = BTreeSet::new();
    let mut states = BTreeSet::new();
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut data: BTreeMap<&'static str, BTreeMap<String, Vec<Value>>> = BTreeMap::new();

    for doc in docs {
        let source_type = doc.source_type().as_str();
        years.insert(doc.year.clone());
        states.extend(doc.records.states());
        *counts.entry(source_type).or_default() += doc.records.len();
        data.entry(source_type)
            .or_default()
            .entry(doc.year.clone())
            .or_default()
            .extend(doc.records.to_values());
    }
    let total: usize = counts.values().sum();

    json!({
        "metadata": {
            "generated_at": generated_at,
            "description": "Groundwater resource assessments decoded from the published state reports, central reports, annexures and attribute reports",
            "years_covered": years,
            "states_covered": states,
            "total_records": total,
            "record_counts": counts,
            "units": {
                "rainfall": "mm (millimeters)",
                "area": "ha (hectares); sq km for annexure 3E/3F",
                "volume": "ham (hectare meters = 10,000 cubic meters); bcm (billion cubic meters) for annexure 1",
                "stage_of_extraction": "% (percent)"
            },
            "quality_classification": {
                "contaminated": "C - Areas where groundwater quality exceeds permissible limits for certain parameters",
                "non_contaminated": "NC - Areas where groundwater quality is within acceptable limits",
                "poor_quality": "PQ - Areas with significant quality issues",
                "total": "Sum over the quality facets"
            },
            "category_definitions": {
                "Safe": "Stage of extraction < 70%",
                "Semi-Critical": "Stage of extraction 70-90%",
                "Critical": "Stage of extraction 90-100%",
                "Over-Exploited": "Stage of extraction > 100%",
                "Saline": "Groundwater is saline"
            }
        },
        "data": data
    })
}

/// Write `all_reports_master.json`.
pub fn write_master(layout: &OutputLayout, docs: &[SourceDocument]) -> Result<PathBuf> {
    let generated_at = chrono::Utc::now().to_rfc3339();
    let path = layout.master_path();
    write_json_file(&path, &master_document(docs, &generated_at))?;
    Ok(path)
}

/// Line-oriented JSON writer.
pub struct JsonlWriter<W: Write> {
    inner: W,
    lines: usize,
}

impl JsonlWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    pub fn write<T: Serialize>(&mut self, item: &T) -> Result<()> {
        serde_json::to_writer(&mut self.inner, item)?;
        self.inner.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and return the number of lines written.
    pub fn finish(mut self) -> Result<usize> {
        self.inner.flush()?;
        Ok(self.lines)
    }
}

/// Read a JSONL file as JSON objects; blank lines are skipped.
pub fn read_jsonl(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let obj: Map<String, Value> = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON line", path.display(), idx + 1))?;
        out.push(obj);
    }
    Ok(out)
}

/// Per-source-type line counts of a JSONL corpus.
pub fn count_by_source_type(rows: &[Map<String, Value>]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let key = row
            .get("source_type")
            .and_then(Value::as_str)
            .and_then(SourceType::parse)
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        *counts.entry(key).or_default() += 1;
    }
    counts
}
