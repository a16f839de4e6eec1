//! Sectioned table scanner.
//!
//! Several report families pack one table per state into a single sheet.
//! Each section opens with a sentinel row whose first cell contains a
//! marker phrase (e.g. `DYNAMIC GROUND WATER RESOURCES ...`), followed by a
//! row whose first cell names the state. [`SectionScanner`] walks a sheet
//! top to bottom as a two-state machine and classifies every row:
//!
//! | Row | Classification | Effect |
//! |-----|----------------|--------|
//! | first cell contains the sentinel | header | enter `InSection`; next row's first cell becomes the section key |
//! | row right after a header, key captured | section name | consumed |
//! | serial fails to parse as a number ≥ 1 | noise | skipped |
//! | name column blank or a known header/footer literal | noise | skipped |
//! | anything else | data | yielded with the current key |
//!
//! A sheet without sentinels is one implicit section with key `None`.
//! The key persists until the next sentinel. Scanners are not reused
//! across sheets; every traversal starts in `SeekingHeader`.

use serde::{Deserialize, Serialize};

use crate::coerce::{classify_float, to_string, Cell, Coerced, Row};

/// Section-name cells that are really repeated column headers.
const HEADER_KEYS: &[&str] = &["S.No", "S.NO", "ABSTRACT"];

/// Layout contract for scanning one sheet.
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// 0-based index of the first row that may hold data.
    pub first_row: usize,
    /// Marker phrase of section header rows, matched case-insensitively.
    pub sentinel: Option<&'static str>,
    /// Column that must hold a serial number ≥ 1 on data rows.
    pub serial_col: Option<usize>,
    /// Column holding the row's name (state or district).
    pub name_col: usize,
    /// Header/footer literals in the name column that mark noise rows.
    pub noise: &'static [&'static str],
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    SeekingHeader,
    InSection,
}

/// Classification of a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    /// Sentinel row. `captured` holds the new section key, if the next row supplied one.
    SectionHeader { captured: Option<String> },
    Noise,
    Data,
}

/// A data row tagged with the section it was found in.
#[derive(Debug, Clone)]
pub struct DataRow<'r> {
    /// 0-based row index within the sheet.
    pub index: usize,
    pub section: Option<String>,
    pub cells: &'r [Cell],
}

/// Row counts from one sheet traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub data_rows: usize,
    pub noise_rows: usize,
    pub sections: usize,
}

impl ScanStats {
    pub fn absorb(&mut self, other: &ScanStats) {
        self.data_rows += other.data_rows;
        self.noise_rows += other.noise_rows;
        self.sections += other.sections;
    }
}

/// Output of [`SectionScanner::scan`].
#[derive(Debug)]
pub struct ScanOutput<'r> {
    pub rows: Vec<DataRow<'r>>,
    pub stats: ScanStats,
}

/// Two-state scanner carrying the current section key.
pub struct SectionScanner<'s> {
    spec: &'s TableSpec,
    state: ScanState,
    current: Option<String>,
}

impl<'s> SectionScanner<'s> {
    pub fn new(spec: &'s TableSpec) -> Self {
        Self {
            spec,
            state: ScanState::SeekingHeader,
            current: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn current_section(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Classify `row`, peeking at `next` when `row` is a section header.
    pub fn classify(&mut self, row: &[Cell], next: Option<&[Cell]>) -> RowClass {
        if self.is_sentinel(row) {
            self.state = ScanState::InSection;
            let captured = next
                .and_then(|n| n.first())
                .map(|c| to_string(Some(c), ""))
                .filter(|key| !key.is_empty() && !is_header_key(key));
            if let Some(key) = &captured {
                self.current = Some(key.clone());
            }
            return RowClass::SectionHeader { captured };
        }
        if self.is_noise(row) {
            RowClass::Noise
        } else {
            RowClass::Data
        }
    }

    /// Walk `rows` from the spec's first row and collect data rows.
    pub fn scan<'r>(mut self, rows: &'r [Row]) -> ScanOutput<'r> {
        let mut out = Vec::new();
        let mut stats = ScanStats::default();
        let mut idx = self.spec.first_row;
        while idx < rows.len() {
            let next = rows.get(idx + 1).map(|r| r.as_slice());
            match self.classify(&rows[idx], next) {
                RowClass::SectionHeader { captured } => {
                    stats.sections += 1;
                    if captured.is_some() {
                        // the name row is part of the header
                        idx += 1;
                    }
                }
                RowClass::Noise => stats.noise_rows += 1,
                RowClass::Data => {
                    stats.data_rows += 1;
                    out.push(DataRow {
                        index: idx,
                        section: self.current.clone(),
                        cells: &rows[idx],
                    });
                }
            }
            idx += 1;
        }
        ScanOutput { rows: out, stats }
    }

    fn is_sentinel(&self, row: &[Cell]) -> bool {
        let Some(marker) = self.spec.sentinel else {
            return false;
        };
        match row.first() {
            Some(Cell::Text(s)) => s.to_uppercase().contains(&marker.to_uppercase()),
            _ => false,
        }
    }

    fn is_noise(&self, row: &[Cell]) -> bool {
        if let Some(col) = self.spec.serial_col {
            match classify_float(row.get(col)) {
                Coerced::Value(v) if v >= 1.0 => {}
                _ => return true,
            }
        }
        let name = to_string(row.get(self.spec.name_col), "");
        name.is_empty()
            || self
                .spec
                .noise
                .iter()
                .any(|literal| literal.trim().eq_ignore_ascii_case(&name))
    }
}

fn is_header_key(key: &str) -> bool {
    HEADER_KEYS.iter().any(|h| h.eq_ignore_ascii_case(key.trim()))
}
