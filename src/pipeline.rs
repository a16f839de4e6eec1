//! Batch pipeline orchestration.
//!
//! Coordinates the run: discovery → workbook reading → sheet decoding →
//! intermediate JSON + master document, then intermediate JSON → fact and
//! chunk corpora. Every workbook is processed inside its own failure
//! boundary: an unreadable file or a missing required sheet is logged and
//! listed in the summary while the run continues. Only failures to write
//! outputs abort the run.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::Result;
use groundwater_core::chunks::build_chunks;
use groundwater_core::facts::derive_facts;
use groundwater_core::models::{SourceDocument, SourceType};
use groundwater_core::schema::{decode_sheet, DecodeContext, DecodeStats};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discover::{discover, SourceFile};
use crate::output::{self, JsonlWriter, OutputLayout};
use crate::progress::{ProgressEvent, ProgressReporter, Stage};
use crate::workbook::{Workbook, WorkbookError};

/// A workbook that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// One decoded sheet plus its counters.
#[derive(Debug, Clone)]
pub struct DecodedSheet {
    pub document: SourceDocument,
    pub stats: DecodeStats,
}

/// Result of reading one workbook.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub sheets: Vec<DecodedSheet>,
    /// Optional sheets the workbook does not contain.
    pub missing_optional: Vec<SourceType>,
}

/// Outcome of `gwc extract`.
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub files_found: usize,
    pub files_processed: usize,
    pub documents_written: usize,
    pub stats: BTreeMap<SourceType, DecodeStats>,
    pub sheets_skipped: usize,
    pub failures: Vec<FileFailure>,
}

impl ExtractSummary {
    pub fn total_records(&self) -> usize {
        self.stats.values().map(|s| s.records).sum()
    }
}

impl fmt::Display for ExtractSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut total = DecodeStats::default();
        for s in self.stats.values() {
            total.absorb(s);
        }
        writeln!(f, "extract")?;
        writeln!(f, "  files found: {}", self.files_found)?;
        writeln!(f, "  files processed: {}", self.files_processed)?;
        writeln!(f, "  documents written: {}", self.documents_written)?;
        writeln!(f, "  records: {}", total.records)?;
        for (source_type, s) in &self.stats {
            writeln!(f, "    {:<20} {:>8}", source_type.as_str(), s.records)?;
        }
        writeln!(f, "  rows skipped (noise): {}", total.scan.noise_rows)?;
        writeln!(f, "  rows rejected: {}", total.rejected_rows)?;
        writeln!(f, "  cells defaulted: {}", total.invalid_cells)?;
        if self.sheets_skipped > 0 {
            writeln!(f, "  optional sheets absent: {}", self.sheets_skipped)?;
        }
        writeln!(f, "  failed files: {}", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "    {}: {}", failure.file, failure.reason)?;
        }
        write!(f, "ok")
    }
}

/// Outcome of `gwc facts` or `gwc chunks`.
#[derive(Debug, Clone)]
pub struct DeriveSummary {
    pub stage: Stage,
    pub documents: usize,
    pub counts: BTreeMap<SourceType, usize>,
}

impl DeriveSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for DeriveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self.stage {
            Stage::Facts => "facts",
            Stage::Chunks => "chunks",
        };
        writeln!(f, "{}", self.stage.as_str())?;
        writeln!(f, "  documents read: {}", self.documents)?;
        writeln!(f, "  {} written: {}", noun, self.total())?;
        for (source_type, n) in &self.counts {
            writeln!(f, "    {:<20} {:>8}", source_type.as_str(), n)?;
        }
        write!(f, "ok")
    }
}

/// Read and decode every sheet one workbook contributes.
pub fn extract_file(file: &SourceFile) -> Result<FileOutcome, WorkbookError> {
    let mut workbook = Workbook::open(&file.path)?;
    let ctx = DecodeContext {
        year: file.year.clone(),
        fallback_state: file.state.clone(),
    };

    let mut outcome = FileOutcome::default();
    for &source_type in file.family.source_types() {
        let sheet = source_type.sheet_name();
        if let Some(name) = sheet {
            if !workbook.has_sheet(name) && !source_type.sheet_required() {
                debug!(file = %file.relative, sheet = name, "optional sheet absent");
                outcome.missing_optional.push(source_type);
                continue;
            }
        }

        let rows = workbook.rows(sheet)?;
        let decoded = decode_sheet(source_type, &rows, &ctx);
        debug!(
            file = %file.relative,
            source_type = source_type.as_str(),
            rows = rows.len(),
            noise_rows = decoded.stats.scan.noise_rows,
            rejected_rows = decoded.stats.rejected_rows,
            invalid_cells = decoded.stats.invalid_cells,
            "sheet decoded"
        );
        outcome.sheets.push(DecodedSheet {
            document: SourceDocument {
                source_file: file.relative.clone(),
                state: file.state.clone(),
                year: file.year.clone(),
                records: decoded.records,
            },
            stats: decoded.stats,
        });
    }
    Ok(outcome)
}

/// First free stem among `stem`, `stem_2`, `stem_3`, ...
fn unique_stem(taken: &mut HashSet<(SourceType, String)>, source_type: SourceType, stem: String) -> String {
    let mut candidate = stem.clone();
    let mut n = 2;
    while taken.contains(&(source_type, candidate.clone())) {
        candidate = format!("{}_{}", stem, n);
        n += 1;
    }
    taken.insert((source_type, candidate.clone()));
    candidate
}

/// `gwc extract`: workbooks → `records/` + `all_reports_master.json`.
pub fn run_extract(config: &Config, progress: &dyn ProgressReporter) -> Result<ExtractSummary> {
    let layout = OutputLayout::new(&config.paths.output_dir);

    progress.report(ProgressEvent::Discovering {
        data_dir: config.paths.data_dir.display().to_string(),
    });
    let files = discover(config)?;
    info!(files = files.len(), data_dir = %config.paths.data_dir.display(), "discovered workbooks");

    layout.reset_records()?;

    let mut summary = ExtractSummary {
        files_found: files.len(),
        ..Default::default()
    };
    let mut documents = Vec::new();
    let mut stems = HashSet::new();
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        progress.report(ProgressEvent::Extracting {
            file: file.relative.clone(),
            n: i as u64 + 1,
            total,
        });

        let outcome = match extract_file(file) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %file.relative, error = %e, "skipping workbook");
                summary.failures.push(FileFailure {
                    file: file.relative.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        summary.files_processed += 1;
        summary.sheets_skipped += outcome.missing_optional.len();
        for sheet in outcome.sheets {
            let source_type = sheet.document.source_type();
            summary.stats.entry(source_type).or_default().absorb(&sheet.stats);

            if sheet.document.records.is_empty() {
                warn!(
                    file = %file.relative,
                    source_type = source_type.as_str(),
                    "no records decoded"
                );
                continue;
            }

            let stem = unique_stem(&mut stems, source_type, sheet.document.stem());
            let path = output::write_document(&layout, &sheet.document, &stem)?;
            info!(
                file = %file.relative,
                source_type = source_type.as_str(),
                records = sheet.document.records.len(),
                output = %path.display(),
                "wrote records"
            );
            summary.documents_written += 1;
            documents.push(sheet.document);
        }
    }

    output::write_master(&layout, &documents)?;
    Ok(summary)
}

/// `gwc facts`: intermediate records → `unified_dataset.jsonl`.
pub fn run_facts(config: &Config, progress: &dyn ProgressReporter) -> Result<DeriveSummary> {
    let layout = OutputLayout::new(&config.paths.output_dir);
    let docs = output::load_documents(&layout)?;
    let opts = config.facts.options();

    let mut writer = JsonlWriter::create(&layout.facts_path())?;
    let mut counts = BTreeMap::new();
    let total = docs.len() as u64;
    for (i, doc) in docs.iter().enumerate() {
        let facts = derive_facts(doc, &opts);
        for fact in &facts {
            writer.write(fact)?;
        }
        debug!(source = %doc.source_file, source_type = doc.source_type().as_str(), facts = facts.len(), "facts derived");
        *counts.entry(doc.source_type()).or_default() += facts.len();
        progress.report(ProgressEvent::Deriving {
            stage: Stage::Facts,
            n: i as u64 + 1,
            total,
        });
    }
    let written = writer.finish()?;
    info!(facts = written, output = %layout.facts_path().display(), "wrote fact corpus");

    Ok(DeriveSummary {
        stage: Stage::Facts,
        documents: docs.len(),
        counts,
    })
}

/// `gwc chunks`: intermediate records → `semantic_chunks.jsonl`.
pub fn run_chunks(config: &Config, progress: &dyn ProgressReporter) -> Result<DeriveSummary> {
    let layout = OutputLayout::new(&config.paths.output_dir);
    let docs = output::load_documents(&layout)?;
    let opts = config.chunks.options();

    let mut writer = JsonlWriter::create(&layout.chunks_path())?;
    let mut counts = BTreeMap::new();
    let total = docs.len() as u64;
    for (i, doc) in docs.iter().enumerate() {
        let chunks = build_chunks(doc, &opts);
        for chunk in &chunks {
            writer.write(chunk)?;
        }
        debug!(source = %doc.source_file, source_type = doc.source_type().as_str(), chunks = chunks.len(), "chunks built");
        *counts.entry(doc.source_type()).or_default() += chunks.len();
        progress.report(ProgressEvent::Deriving {
            stage: Stage::Chunks,
            n: i as u64 + 1,
            total,
        });
    }
    let written = writer.finish()?;
    info!(chunks = written, output = %layout.chunks_path().display(), "wrote chunk corpus");

    Ok(DeriveSummary {
        stage: Stage::Chunks,
        documents: docs.len(),
        counts,
    })
}
