//! Semantic chunk builder.
//!
//! Renders one paragraph per location and year, aggregating the metrics of a
//! record in a fixed order: identity header, area and rainfall, recharge,
//! resources and extraction, status, then trend and storage addenda. The
//! stressed-units (4A) and quality-problem (4B) annexures are grouped per
//! state into a single chunk each.
//!
//! Every chunk carries a small `metadata` map of high-signal figures for
//! structured filtering; it never holds the full record.

mod annexures;
mod reports;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::chunk_id;
use crate::models::{ExtractionByUse, Location, RecordSet, SourceDocument, SourceType};

/// Limits of the grouped unit-list chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Unit names listed per category in a stressed-units chunk.
    pub max_listed_units: usize,
    /// Unit names listed per contaminant in a quality-issues chunk.
    pub max_listed_quality_units: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_listed_units: 10,
            max_listed_quality_units: 8,
        }
    }
}

/// One retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub state: String,
    pub district: Option<String>,
    pub block: Option<String>,
    pub year: String,
    pub source_type: SourceType,
    pub source: String,
    pub categorization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watershed: Option<String>,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Magnitude formatting: `1.50M`, `12.34K`, `42`, `3.14`.
pub fn format_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1_000_000.0 {
        format!("{:.2}M", v / 1_000_000.0)
    } else if a >= 1_000.0 {
        format!("{:.2}K", v / 1_000.0)
    } else if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

/// `"<block> block in <district> district, <state>"`, degrading to the
/// district or the state alone.
pub fn place(loc: &Location) -> String {
    match (&loc.district, &loc.block) {
        (Some(d), Some(b)) => format!("{} block in {} district, {}", b, d, loc.state),
        (Some(d), None) => format!("{} district, {}", d, loc.state),
        _ => loc.state.clone(),
    }
}

/// `" (irrigation a, domestic b, industrial c)"`; industrial only when
/// non-zero, nothing at all when irrigation and domestic are both zero.
pub fn extraction_breakdown(e: &ExtractionByUse<f64>, unit: &str) -> String {
    if e.irrigation <= 0.0 && e.domestic <= 0.0 {
        return String::new();
    }
    let mut parts = vec![
        format!("irrigation {} {}", format_value(e.irrigation), unit),
        format!("domestic {} {}", format_value(e.domestic), unit),
    ];
    if e.industrial > 0.0 {
        parts.push(format!("industrial {} {}", format_value(e.industrial), unit));
    }
    format!(" ({})", parts.join(", "))
}

/// Sentences of a chunk, joined with single spaces.
struct Paragraph {
    parts: Vec<String>,
}

impl Paragraph {
    fn new(header: String) -> Self {
        Self {
            parts: vec![header],
        }
    }

    fn line(&mut self, s: impl Into<String>) {
        self.parts.push(s.into());
    }

    /// Push `"<label>: <value> <unit>."` when `v` is positive.
    fn figure(&mut self, label: &str, v: f64, unit: &str) {
        if v > 0.0 {
            self.parts.push(format!("{}: {} {}.", label, format_value(v), unit));
        }
    }

    /// Items joined by `" | "` and closed with a period; nothing when empty.
    fn section(&mut self, items: Vec<String>) {
        if !items.is_empty() {
            self.parts.push(format!("{}.", items.join(" | ")));
        }
    }

    fn finish(self) -> String {
        self.parts.join(" ")
    }
}

/// Whitelisted metadata of a chunk.
#[derive(Default)]
struct Metadata(Map<String, Value>);

impl Metadata {
    fn num(&mut self, key: &str, v: f64) -> &mut Self {
        self.0.insert(key.to_string(), Value::from(v));
        self
    }

    fn non_zero(&mut self, key: &str, v: f64) -> &mut Self {
        if v != 0.0 {
            self.num(key, v);
        }
        self
    }

    fn text(&mut self, key: &str, v: Option<&str>) -> &mut Self {
        if let Some(v) = v {
            self.0.insert(key.to_string(), Value::from(v));
        }
        self
    }

    fn finish(self) -> Map<String, Value> {
        self.0
    }
}

/// Provenance shared by every chunk of a document.
struct Origin<'a> {
    doc: &'a SourceDocument,
}

impl Origin<'_> {
    /// Assemble a chunk. `disambiguator` is the serial or row position for
    /// per-record chunks and `None` for grouped ones.
    fn chunk(
        &self,
        loc: Location,
        disambiguator: Option<&str>,
        categorization: Option<String>,
        text: String,
        metadata: Map<String, Value>,
    ) -> Chunk {
        let source_type = self.doc.source_type();
        let id = chunk_id(&[
            Some(&loc.state),
            loc.district.as_deref(),
            loc.block.as_deref(),
            Some(&self.doc.year),
            Some(source_type.as_str()),
            disambiguator,
        ]);
        Chunk {
            id,
            state: loc.state,
            district: loc.district,
            block: loc.block,
            year: self.doc.year.clone(),
            source_type,
            source: self.doc.source_file.clone(),
            categorization,
            watershed: None,
            text,
            metadata,
        }
    }
}

/// Build every chunk of one decoded source.
pub fn build_chunks(doc: &SourceDocument, opts: &ChunkOptions) -> Vec<Chunk> {
    let origin = Origin { doc };
    match &doc.records {
        RecordSet::StateReport(v) => reports::state_report(&origin, v),
        RecordSet::CentralReport(v) => reports::central_report(&origin, v),
        RecordSet::AttributeSummary(v) => reports::attribute_summary(&origin, v),
        RecordSet::AttributeDetailed(v) => reports::attribute_detailed(&origin, v),
        RecordSet::Annexure1(v) => annexures::state_resources(&origin, v),
        RecordSet::Annexure2(v) => annexures::district_resources(&origin, v),
        RecordSet::Annexure3a(v) | RecordSet::Annexure3b(v) => {
            annexures::unit_categorization(&origin, v)
        }
        RecordSet::Annexure3c(v) | RecordSet::Annexure3d(v) => {
            annexures::resource_categorization(&origin, v)
        }
        RecordSet::Annexure3e(v) => annexures::state_area(&origin, v),
        RecordSet::Annexure3f(v) => annexures::district_area(&origin, v),
        RecordSet::Annexure4a(v) => annexures::stressed_units(&origin, v, opts.max_listed_units),
        RecordSet::Annexure4b(v) => {
            annexures::quality_problems(&origin, v, opts.max_listed_quality_units)
        }
    }
}
