//! Metric fact normalizer.
//!
//! Walks a curated list of leaves per report family ([`tables`]) and emits
//! one [`Fact`] per leaf: a stable metric key, the value, its unit code, a
//! coarse category and a generated sentence ready for embedding.
//!
//! # Sparsity
//!
//! Empty text is always dropped. A numeric zero is dropped unless
//! [`FactOptions::keep_zero_values`] is set or the metric key contains one
//! of [`ALWAYS_KEEP`] (status counts, stage of extraction, categorization).
//!
//! # Sentences
//!
//! Applied in order, with `<loc>` the most specific of
//! `"<block> block of <district> district, <state>"`,
//! `"<district> district, <state>"` and `"<state>"`:
//!
//! | Value | Sentence |
//! |-------|----------|
//! | non-numeric text | `In <loc> (<year>), <desc> is <value>.` |
//! | unit `count` | `<state> has <v> <desc> as per the <year> groundwater assessment.` |
//! | unit `percent` | `In <loc> (<year>), <desc> is <v>%.` |
//! | any other unit | `In <loc> (<year>), <desc> is <v> <unit name>.` |
//! | no unit | `In <loc> (<year>), <desc> is <v>.` |

pub mod tables;

use serde::{Deserialize, Serialize};

use crate::identity::fact_id;
use crate::models::{Categorization, Location, SourceDocument, SourceType};
use crate::names::clean_location;

/// Substrings of metric keys whose zero values are still meaningful.
pub const ALWAYS_KEEP: &[&str] = &[
    "over_exploited_count",
    "critical_count",
    "saline_count",
    "stage_of_extraction",
    "categorization",
];

/// Unit of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Ham,
    Bcm,
    Mm,
    Ha,
    SqKm,
    Percent,
    Count,
    None,
}

impl Unit {
    /// Code written to the `unit` field.
    pub fn code(&self) -> &'static str {
        match self {
            Unit::Ham => "ham",
            Unit::Bcm => "bcm",
            Unit::Mm => "mm",
            Unit::Ha => "ha",
            Unit::SqKm => "sq_km",
            Unit::Percent => "percent",
            Unit::Count => "count",
            Unit::None => "",
        }
    }

    /// Expanded name used in sentences.
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Ham => "hectare meters",
            Unit::Bcm => "billion cubic meters",
            Unit::Mm => "millimeters",
            Unit::Ha => "hectares",
            Unit::SqKm => "square kilometers",
            Unit::Percent => "percent",
            Unit::Count => "units",
            Unit::None => "",
        }
    }
}

/// Numeric or textual fact value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(f64),
    Text(String),
}

impl FactValue {
    fn is_blank(&self) -> bool {
        match self {
            FactValue::Number(_) => false,
            FactValue::Text(s) => s.trim().is_empty(),
        }
    }

    fn is_zero(&self) -> bool {
        matches!(self, FactValue::Number(v) if *v == 0.0)
    }

    /// Text that reads as a plain number once dots and dashes are removed.
    fn numeric_text(s: &str) -> bool {
        let digits: String = s.chars().filter(|c| *c != '.' && *c != '-').collect();
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }
}

/// One metric of one location, ready for the retrieval corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub state: String,
    pub district: Option<String>,
    pub block: Option<String>,
    pub year: String,
    pub metric: String,
    pub value: FactValue,
    pub unit: String,
    pub category: String,
    pub categorization: Option<String>,
    pub source: String,
    pub source_type: SourceType,
    pub text: String,
}

/// Knobs of the normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactOptions {
    /// Emit numeric facts whose value is zero.
    #[serde(default)]
    pub keep_zero_values: bool,
}

/// Format a number for a sentence: integral values without decimals,
/// everything else with two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

/// `"<block> block of <district> district, <state>"`, degrading to the
/// district or the state alone.
pub fn describe_location(loc: &Location) -> String {
    match (&loc.district, &loc.block) {
        (Some(d), Some(b)) => format!("{} block of {} district, {}", b, d, loc.state),
        (Some(d), None) => format!("{} district, {}", d, loc.state),
        _ => loc.state.clone(),
    }
}

/// Sentence for one fact.
pub fn sentence(loc: &Location, year: &str, description: &str, value: &FactValue, unit: Unit) -> String {
    let place = describe_location(loc);
    let shown = match value {
        FactValue::Text(s) if !FactValue::numeric_text(s) => {
            return format!("In {} ({}), {} is {}.", place, year, description, s);
        }
        FactValue::Text(s) => s.clone(),
        FactValue::Number(v) => format_number(*v),
    };
    match unit {
        // counts read at state level even for district rows
        Unit::Count => format!(
            "{} has {} {} as per the {} groundwater assessment.",
            loc.state, shown, description, year
        ),
        Unit::Percent => format!("In {} ({}), {} is {}%.", place, year, description, shown),
        Unit::None => format!("In {} ({}), {} is {}.", place, year, description, shown),
        other => format!(
            "In {} ({}), {} is {} {}.",
            place,
            year,
            description,
            shown,
            other.name()
        ),
    }
}

/// Whether a value survives the sparsity rule.
pub fn keeps(metric: &str, value: &FactValue, opts: &FactOptions) -> bool {
    if value.is_blank() {
        return false;
    }
    if value.is_zero() && !opts.keep_zero_values {
        let key = metric.to_lowercase();
        return ALWAYS_KEEP.iter().any(|m| key.contains(m));
    }
    true
}

/// Everything a fact needs besides the metric itself.
pub struct FactScope<'a> {
    pub loc: Location,
    pub year: &'a str,
    pub source: &'a str,
    pub source_type: SourceType,
    pub categorization: Option<String>,
    /// Position of the record within its source; keeps ids unique when a
    /// sheet repeats a location.
    pub row: usize,
}

/// Collects facts for one document.
pub struct FactSink<'a> {
    opts: &'a FactOptions,
    out: Vec<Fact>,
}

impl<'a> FactSink<'a> {
    pub fn new(opts: &'a FactOptions) -> Self {
        Self {
            opts,
            out: Vec::new(),
        }
    }

    /// Push a fact with a generated sentence, subject to the sparsity rule.
    pub fn push(
        &mut self,
        scope: &FactScope<'_>,
        metric: &str,
        value: FactValue,
        unit: Unit,
        category: &str,
        description: &str,
    ) {
        if !keeps(metric, &value, self.opts) {
            return;
        }
        let text = sentence(&scope.loc, scope.year, description, &value, unit);
        self.push_with_text(scope, metric, value, unit, category, text);
    }

    /// Push a fact with a caller-written sentence. Blank values are still dropped.
    pub fn push_with_text(
        &mut self,
        scope: &FactScope<'_>,
        metric: &str,
        value: FactValue,
        unit: Unit,
        category: &str,
        text: String,
    ) {
        if value.is_blank() {
            return;
        }
        let row = scope.row.to_string();
        let value_key = match &value {
            FactValue::Text(s) => s.clone(),
            FactValue::Number(_) => String::new(),
        };
        let id = fact_id(&[
            Some(&scope.loc.state),
            scope.loc.district.as_deref(),
            scope.loc.block.as_deref(),
            Some(scope.year),
            Some(metric),
            Some(scope.source_type.as_str()),
            Some(&row),
            Some(&value_key),
        ]);
        self.out.push(Fact {
            id,
            state: scope.loc.state.clone(),
            district: scope.loc.district.clone(),
            block: scope.loc.block.clone(),
            year: scope.year.to_string(),
            metric: metric.to_string(),
            value,
            unit: unit.code().to_string(),
            category: category.to_string(),
            categorization: scope.categorization.clone(),
            source: scope.source.to_string(),
            source_type: scope.source_type,
            text,
        });
    }

    pub fn finish(self) -> Vec<Fact> {
        self.out
    }
}

/// One row of a family's metric table.
pub struct MetricDef<R> {
    pub key: &'static str,
    pub unit: Unit,
    pub category: &'static str,
    pub description: &'static str,
    pub read: fn(&R) -> Option<FactValue>,
}

/// Apply a metric table to every record of a document.
pub fn table_facts<R>(
    sink: &mut FactSink<'_>,
    doc: &SourceDocument,
    records: &[R],
    defs: &[MetricDef<R>],
    location: fn(&R) -> Location,
    categorization: fn(&R) -> Option<Categorization>,
) {
    for (row, record) in records.iter().enumerate() {
        let scope = FactScope {
            loc: clean_location(&location(record)),
            year: &doc.year,
            source: &doc.source_file,
            source_type: doc.source_type(),
            categorization: categorization(record).map(|c| c.as_str().to_string()),
            row,
        };
        for def in defs {
            if let Some(value) = (def.read)(record) {
                sink.push(&scope, def.key, value, def.unit, def.category, def.description);
            }
        }
    }
}

/// Derive every fact of one decoded source.
pub fn derive_facts(doc: &SourceDocument, opts: &FactOptions) -> Vec<Fact> {
    let mut sink = FactSink::new(opts);
    tables::emit(&mut sink, doc);
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Location {
        Location::block("Kerala", Some("Idukki"), Some("Adimali"))
    }

    #[test]
    fn location_degrades() {
        assert_eq!(describe_location(&block()), "Adimali block of Idukki district, Kerala");
        assert_eq!(
            describe_location(&Location::district("Kerala", Some("Idukki"))),
            "Idukki district, Kerala"
        );
        assert_eq!(describe_location(&Location::state("Kerala")), "Kerala");
        // a block without a district reads as state level
        assert_eq!(
            describe_location(&Location::block("Kerala", None, Some("Adimali"))),
            "Kerala"
        );
    }

    #[test]
    fn sentence_rules_in_order() {
        let loc = block();
        assert_eq!(
            sentence(&loc, "2022-2023", "groundwater status category", &FactValue::Text("Safe".into()), Unit::None),
            "In Adimali block of Idukki district, Kerala (2022-2023), groundwater status category is Safe."
        );
        assert_eq!(
            sentence(&Location::state("Goa"), "2022-2023", "safe units", &FactValue::Number(12.0), Unit::Count),
            "Goa has 12 safe units as per the 2022-2023 groundwater assessment."
        );
        assert_eq!(
            sentence(&loc, "2022-2023", "stage of groundwater extraction", &FactValue::Number(64.456), Unit::Percent),
            "In Adimali block of Idukki district, Kerala (2022-2023), stage of groundwater extraction is 64.46%."
        );
        assert_eq!(
            sentence(&loc, "2022-2023", "total rainfall", &FactValue::Number(2500.0), Unit::Mm),
            "In Adimali block of Idukki district, Kerala (2022-2023), total rainfall is 2500 millimeters."
        );
        assert_eq!(
            sentence(&loc, "2022-2023", "trend", &FactValue::Text("12".into()), Unit::None),
            "In Adimali block of Idukki district, Kerala (2022-2023), trend is 12."
        );
    }

    #[test]
    fn zero_values_are_dropped_unless_always_kept() {
        let off = FactOptions::default();
        let zero = FactValue::Number(0.0);
        assert!(!keeps("extraction_total_ham", &zero, &off));
        assert!(keeps("stage_of_extraction_percent", &zero, &off));
        assert!(keeps("state_categorization_safe_units_count", &zero, &off));
        assert!(keeps("critical_count", &zero, &off));
        assert!(!keeps("safe_units_count", &zero, &off));
        assert!(keeps("extraction_total_ham", &zero, &FactOptions { keep_zero_values: true }));
        assert!(!keeps("categorization_status", &FactValue::Text("  ".into()), &off));
        assert!(keeps("extraction_total_ham", &FactValue::Number(-3.0), &off));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(2.0 / 3.0), "0.67");
        assert_eq!(format_number(-4.5), "-4.50");
    }

    #[test]
    fn fact_json_keys() {
        let opts = FactOptions::default();
        let mut sink = FactSink::new(&opts);
        let scope = FactScope {
            loc: block(),
            year: "2022-2023",
            source: "stateReportKerala2022-23.xlsx",
            source_type: SourceType::StateReport,
            categorization: Some("safe".into()),
            row: 0,
        };
        sink.push(&scope, "rainfall_total_mm", FactValue::Number(2500.0), Unit::Mm, "rainfall", "total rainfall");
        let facts = sink.finish();
        let json = serde_json::to_value(&facts[0]).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for k in [
            "id", "state", "district", "block", "year", "metric", "value", "unit", "category",
            "categorization", "source", "source_type", "text",
        ] {
            assert!(keys.contains(&k), "missing {}", k);
        }
        assert_eq!(json["value"], 2500.0);
        assert_eq!(json["unit"], "mm");
        assert_eq!(json["source_type"], "state_report");
        assert_eq!(facts[0].id.len(), 12);
    }
}
