//! Schema decoders: worksheet rows → canonical records.
//!
//! Column layouts are data, not code. Each report family declares a static
//! [`TableSpec`] (where its rows live) and a static list of [`Field`]s (which
//! columns feed which dotted record path, and in what shape). A single
//! [`RowReader::fields`] routine turns a row into a JSON object following the
//! layout; the family's decoder adds identity columns and rejects rows that
//! do not describe a unit; `serde` then builds the typed record.
//!
//! # Shapes
//!
//! | [`Shape`] | Columns | JSON written at `path` |
//! |-----------|---------|------------------------|
//! | `Number` | 1 | number |
//! | `Text` | 1 | string or `null` |
//! | `Facets(keys)` | `keys.len()` | `{key: number, ...}` |
//! | `TextFacets(keys)` | `keys.len()` | `{key: string or null, ...}` |
//! | `Categories(v)` | 10 | `{safe: {v, percent}, semi_critical: {...}, ...}` |
//!
//! Decoding never fails: blank and garbage cells become `0.0` (garbage is
//! counted in [`DecodeStats::invalid_cells`]) and rows that cannot form a
//! record are counted in [`DecodeStats::rejected_rows`].

pub mod attribute;
pub mod categorization;
pub mod central_report;
pub mod resources;
pub mod state_report;
pub mod unit_lists;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{classify_float, to_opt_string, Cell, Coerced, Row};
use crate::models::{RecordSet, SourceType, CATEGORY_KEYS, FRESH_SALINE, QUALITY_FACETS};
use crate::scanner::{DataRow, ScanStats, SectionScanner, TableSpec};

/// State name used when neither the row, its section nor the file names one.
pub const UNKNOWN_STATE: &str = "Unknown";

/// How a field's columns map onto its record path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Number,
    Text,
    Facets(&'static [&'static str]),
    TextFacets(&'static [&'static str]),
    /// Five `(value, percent)` pairs in [`CATEGORY_KEYS`] order; the
    /// payload names the value key.
    Categories(&'static str),
}

impl Shape {
    /// Number of consecutive columns consumed.
    pub fn width(&self) -> usize {
        match self {
            Shape::Number | Shape::Text => 1,
            Shape::Facets(keys) | Shape::TextFacets(keys) => keys.len(),
            Shape::Categories(_) => CATEGORY_KEYS.len() * 2,
        }
    }
}

/// One layout entry: `shape` read from `col` onward, written at `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Dotted record path; empty writes at the record root.
    pub path: &'static str,
    pub col: usize,
    pub shape: Shape,
}

pub const fn number(path: &'static str, col: usize) -> Field {
    Field { path, col, shape: Shape::Number }
}

pub const fn text(path: &'static str, col: usize) -> Field {
    Field { path, col, shape: Shape::Text }
}

/// Four-facet quality group starting at `col`.
pub const fn quality(path: &'static str, col: usize) -> Field {
    Field { path, col, shape: Shape::Facets(QUALITY_FACETS) }
}

pub const fn fresh_saline(path: &'static str, col: usize) -> Field {
    Field { path, col, shape: Shape::Facets(FRESH_SALINE) }
}

pub const fn text_facets(path: &'static str, col: usize, keys: &'static [&'static str]) -> Field {
    Field { path, col, shape: Shape::TextFacets(keys) }
}

pub const fn categories(path: &'static str, col: usize, value_key: &'static str) -> Field {
    Field { path, col, shape: Shape::Categories(value_key) }
}

/// Per-sheet context handed to every row decoder.
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    /// Reporting year, `YYYY-YYYY` or `unknown`.
    pub year: String,
    /// State implied by the file name, for families whose rows may omit it.
    pub fallback_state: Option<String>,
}

/// Cell access for one row, counting cells that held unparseable numbers.
pub struct RowReader<'r> {
    cells: &'r [Cell],
    invalid: usize,
}

impl<'r> RowReader<'r> {
    pub fn new(cells: &'r [Cell]) -> Self {
        Self { cells, invalid: 0 }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn invalid_cells(&self) -> usize {
        self.invalid
    }

    /// Numeric cell; missing and invalid content read as `0.0`.
    pub fn float(&mut self, col: usize) -> f64 {
        match classify_float(self.cells.get(col)) {
            Coerced::Value(v) => v,
            Coerced::Missing => 0.0,
            Coerced::Invalid => {
                self.invalid += 1;
                0.0
            }
        }
    }

    pub fn text(&self, col: usize) -> Option<String> {
        to_opt_string(self.cells.get(col))
    }

    /// Build the JSON object described by `layout`.
    pub fn fields(&mut self, layout: &[Field]) -> Map<String, Value> {
        let mut map = Map::new();
        for field in layout {
            let col = field.col;
            match field.shape {
                Shape::Number => {
                    let v = self.float(col);
                    insert_path(&mut map, field.path, Value::from(v));
                }
                Shape::Text => {
                    insert_path(&mut map, field.path, Value::from(self.text(col)));
                }
                Shape::Facets(keys) => {
                    for (k, key) in keys.iter().enumerate() {
                        let v = self.float(col + k);
                        insert_path(&mut map, &join(field.path, key), Value::from(v));
                    }
                }
                Shape::TextFacets(keys) => {
                    for (k, key) in keys.iter().enumerate() {
                        let v = self.text(col + k);
                        insert_path(&mut map, &join(field.path, key), Value::from(v));
                    }
                }
                Shape::Categories(value_key) => {
                    for (k, cat) in CATEGORY_KEYS.iter().enumerate() {
                        let base = join(field.path, cat);
                        let value = self.float(col + 2 * k);
                        let percent = self.float(col + 2 * k + 1);
                        insert_path(&mut map, &join(&base, value_key), Value::from(value));
                        insert_path(&mut map, &join(&base, "percent"), Value::from(percent));
                    }
                }
            }
        }
        map
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Insert `value` at a dotted path, creating intermediate objects.
pub fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Row decoder: identity columns plus layout, or `None` to reject the row.
pub type RowDecoder =
    fn(&mut RowReader<'_>, &DataRow<'_>, &DecodeContext) -> Option<Map<String, Value>>;

/// Counters from decoding one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    #[serde(flatten)]
    pub scan: ScanStats,
    pub records: usize,
    /// Data rows the decoder or the record model refused.
    pub rejected_rows: usize,
    /// Cells with content that did not parse as a number (read as `0.0`).
    pub invalid_cells: usize,
}

impl DecodeStats {
    pub fn absorb(&mut self, other: &DecodeStats) {
        self.scan.absorb(&other.scan);
        self.records += other.records;
        self.rejected_rows += other.rejected_rows;
        self.invalid_cells += other.invalid_cells;
    }
}

/// Typed records and counters for one sheet.
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    pub records: RecordSet,
    pub stats: DecodeStats,
}

/// Row-location contract of a family.
pub fn table(source_type: SourceType) -> &'static TableSpec {
    match source_type {
        SourceType::StateReport => &state_report::TABLE,
        SourceType::CentralReport => &central_report::TABLE,
        SourceType::Annexure1 => &resources::STATE_TABLE,
        SourceType::Annexure2 => &resources::DISTRICT_TABLE,
        SourceType::Annexure3a => &categorization::UNITS_STATE_TABLE,
        SourceType::Annexure3b => &categorization::SECTIONED_TABLE,
        SourceType::Annexure3c => &categorization::RESOURCE_STATE_TABLE,
        SourceType::Annexure3d => &categorization::SECTIONED_TABLE,
        SourceType::Annexure3e => &categorization::AREA_STATE_TABLE,
        SourceType::Annexure3f => &categorization::SECTIONED_TABLE,
        SourceType::Annexure4a => &unit_lists::STRESSED_TABLE,
        SourceType::Annexure4b => &unit_lists::QUALITY_TABLE,
        SourceType::AttributeSummary => &attribute::SUMMARY_TABLE,
        SourceType::AttributeDetailed => &attribute::DETAIL_TABLE,
    }
}

/// Column layout of a family (identity columns excluded).
pub fn layout(source_type: SourceType) -> &'static [Field] {
    match source_type {
        SourceType::StateReport => state_report::LAYOUT,
        SourceType::CentralReport => central_report::LAYOUT,
        SourceType::Annexure1 => resources::STATE_LAYOUT,
        SourceType::Annexure2 => resources::DISTRICT_LAYOUT,
        SourceType::Annexure3a | SourceType::Annexure3b => categorization::UNITS_LAYOUT,
        SourceType::Annexure3c | SourceType::Annexure3d => categorization::RESOURCE_LAYOUT,
        SourceType::Annexure3e => categorization::STATE_AREA_LAYOUT,
        SourceType::Annexure3f => categorization::DISTRICT_AREA_LAYOUT,
        SourceType::Annexure4a => unit_lists::STRESSED_LAYOUT,
        SourceType::Annexure4b => unit_lists::QUALITY_LAYOUT,
        SourceType::AttributeSummary => attribute::SUMMARY_LAYOUT,
        SourceType::AttributeDetailed => attribute::DETAIL_LAYOUT,
    }
}

/// Scan `rows` with the family's table contract and decode every data row.
pub fn decode_sheet(source_type: SourceType, rows: &[Row], ctx: &DecodeContext) -> SheetOutcome {
    let scanned = SectionScanner::new(table(source_type)).scan(rows);
    let mut stats = DecodeStats {
        scan: scanned.stats,
        ..Default::default()
    };
    let data = &scanned.rows;
    let s = &mut stats;
    let records = match source_type {
        SourceType::StateReport => {
            RecordSet::StateReport(collect(data, ctx, state_report::decode, s))
        }
        SourceType::CentralReport => {
            RecordSet::CentralReport(collect(data, ctx, central_report::decode, s))
        }
        SourceType::Annexure1 => RecordSet::Annexure1(collect(data, ctx, resources::decode_state, s)),
        SourceType::Annexure2 => {
            RecordSet::Annexure2(collect(data, ctx, resources::decode_district, s))
        }
        SourceType::Annexure3a => {
            RecordSet::Annexure3a(collect(data, ctx, categorization::decode_units_state, s))
        }
        SourceType::Annexure3b => {
            RecordSet::Annexure3b(collect(data, ctx, categorization::decode_units_district, s))
        }
        SourceType::Annexure3c => {
            RecordSet::Annexure3c(collect(data, ctx, categorization::decode_resource_state, s))
        }
        SourceType::Annexure3d => {
            RecordSet::Annexure3d(collect(data, ctx, categorization::decode_resource_district, s))
        }
        SourceType::Annexure3e => {
            RecordSet::Annexure3e(collect(data, ctx, categorization::decode_area_state, s))
        }
        SourceType::Annexure3f => {
            RecordSet::Annexure3f(collect(data, ctx, categorization::decode_area_district, s))
        }
        SourceType::Annexure4a => {
            RecordSet::Annexure4a(collect(data, ctx, unit_lists::decode_stressed, s))
        }
        SourceType::Annexure4b => {
            RecordSet::Annexure4b(collect(data, ctx, unit_lists::decode_quality, s))
        }
        SourceType::AttributeSummary => {
            RecordSet::AttributeSummary(collect(data, ctx, attribute::decode_summary, s))
        }
        SourceType::AttributeDetailed => {
            RecordSet::AttributeDetailed(collect(data, ctx, attribute::decode_detail, s))
        }
    };
    stats.records = records.len();
    SheetOutcome { records, stats }
}

fn collect<T: DeserializeOwned>(
    rows: &[DataRow<'_>],
    ctx: &DecodeContext,
    decode: RowDecoder,
    stats: &mut DecodeStats,
) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut reader = RowReader::new(row.cells);
        let Some(mut map) = decode(&mut reader, row, ctx) else {
            stats.rejected_rows += 1;
            continue;
        };
        stats.invalid_cells += reader.invalid_cells();
        map.insert("year".to_string(), Value::from(ctx.year.clone()));
        match serde_json::from_value::<T>(Value::Object(map)) {
            Ok(record) => out.push(record),
            Err(_) => stats.rejected_rows += 1,
        }
    }
    out
}

/// Section key, else the file's state, else [`UNKNOWN_STATE`].
pub(crate) fn section_state(row: &DataRow<'_>, ctx: &DecodeContext) -> String {
    row.section
        .clone()
        .or_else(|| ctx.fallback_state.clone())
        .unwrap_or_else(|| UNKNOWN_STATE.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A row whose cell `i` holds the number `i`.
    pub fn indexed_row(width: usize) -> Row {
        (0..width).map(|i| Cell::Number(i as f64)).collect()
    }

    /// Set `col` to text, growing the row if needed.
    pub fn put(row: &mut Row, col: usize, value: &str) {
        if row.len() <= col {
            row.resize(col + 1, Cell::Empty);
        }
        row[col] = Cell::from(value);
    }

    pub fn ctx(year: &str) -> DecodeContext {
        DecodeContext {
            year: year.to_string(),
            fallback_state: None,
        }
    }

    pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        path.split('.')
            .filter(|p| !p.is_empty())
            .try_fold(value, |v, key| v.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn max_col(layout: &[Field]) -> usize {
        layout.iter().map(|f| f.col + f.shape.width()).max().unwrap_or(0)
    }

    /// Every family layout, every shape: column `col + k` lands at the
    /// k-th key under the field's path.
    #[test]
    fn layouts_place_each_column_at_its_path() {
        for source_type in SourceType::ALL {
            let layout = layout(source_type);
            let row = indexed_row(max_col(layout));
            let map = Value::Object(RowReader::new(&row).fields(layout));
            for field in layout {
                let at = |p: &str| {
                    lookup(&map, p).unwrap_or_else(|| panic!("{}: missing {}", source_type, p))
                };
                match field.shape {
                    Shape::Number => assert_eq!(at(field.path), &Value::from(field.col as f64)),
                    Shape::Text => assert_eq!(at(field.path), &Value::from(field.col.to_string())),
                    Shape::Facets(keys) => {
                        for (k, key) in keys.iter().enumerate() {
                            let expected = Value::from((field.col + k) as f64);
                            assert_eq!(at(&join(field.path, key)), &expected, "{}", source_type);
                        }
                    }
                    Shape::TextFacets(keys) => {
                        for (k, key) in keys.iter().enumerate() {
                            let expected = Value::from((field.col + k).to_string());
                            assert_eq!(at(&join(field.path, key)), &expected, "{}", source_type);
                        }
                    }
                    Shape::Categories(value_key) => {
                        for (k, cat) in CATEGORY_KEYS.iter().enumerate() {
                            let base = join(field.path, cat);
                            let value = Value::from((field.col + 2 * k) as f64);
                            let percent = Value::from((field.col + 2 * k + 1) as f64);
                            assert_eq!(at(&join(&base, value_key)), &value);
                            assert_eq!(at(&join(&base, "percent")), &percent);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn layouts_do_not_overlap() {
        for source_type in SourceType::ALL {
            let mut used = std::collections::HashSet::new();
            for field in layout(source_type) {
                for col in field.col..field.col + field.shape.width() {
                    assert!(used.insert(col), "{}: column {} used twice", source_type, col);
                }
            }
        }
    }

    #[test]
    fn invalid_cells_are_counted_and_zeroed() {
        let row: Row = vec![Cell::from("abc"), Cell::from("-"), Cell::from("1,234.5")];
        let mut reader = RowReader::new(&row);
        assert_eq!(reader.float(0), 0.0);
        assert_eq!(reader.float(1), 0.0);
        assert_eq!(reader.float(2), 1234.5);
        assert_eq!(reader.float(9), 0.0);
        assert_eq!(reader.invalid_cells(), 1);
    }

    #[test]
    fn insert_path_builds_nested_objects() {
        let mut map = Map::new();
        insert_path(&mut map, "a.b.c", Value::from(1.0));
        insert_path(&mut map, "a.b.d", Value::from(2.0));
        insert_path(&mut map, "e", Value::Null);
        let v = Value::Object(map);
        assert_eq!(v["a"]["b"]["c"], 1.0);
        assert_eq!(v["a"]["b"]["d"], 2.0);
        assert!(v["e"].is_null());
    }

    #[test]
    fn empty_sheet_decodes_to_no_records() {
        for source_type in SourceType::ALL {
            let out = decode_sheet(source_type, &[], &ctx("2022-2023"));
            assert!(out.records.is_empty());
            assert_eq!(out.records.source_type(), source_type);
        }
    }
}
