//! XLSX worksheet reader.
//!
//! Reads the OOXML parts of a workbook straight out of the ZIP container
//! with `zip` and `quick-xml`: the sheet list (`xl/workbook.xml` plus its
//! relationships), the shared string table and individual worksheets.
//! Worksheets come back as dense [`Row`]s indexed by 0-based spreadsheet
//! row and column, so fixed column offsets and first-data-row indices can be
//! applied directly.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use groundwater_core::coerce::{Cell, Row};
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;
/// Spreadsheet limits; references beyond them are treated as corrupt.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Workbook-level failure. Any of these fails the whole source file.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a valid XLSX archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("workbook part {part} is missing")]
    MissingPart { part: String },
    #[error("workbook part {part} exceeds size limit ({limit} bytes)")]
    PartTooLarge { part: String, limit: u64 },
    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },
    #[error("sheet '{name}' not found (available: {available})")]
    MissingSheet { name: String, available: String },
}

/// An opened workbook: archive, sheet index and shared strings.
pub struct Workbook {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
}

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
}

impl Workbook {
    /// Open the workbook at `path`.
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let bytes = std::fs::read(path).map_err(|source| WorkbookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    /// Open a workbook held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, WorkbookError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let shared_strings = match read_zip_entry_bounded(&mut archive, "xl/sharedStrings.xml") {
            Ok(xml) => read_shared_strings(&xml)?,
            Err(WorkbookError::MissingPart { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        let sheets = list_sheets(&mut archive)?;
        Ok(Self {
            archive,
            sheets,
            shared_strings,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Rows of the named sheet, or of the first sheet when `name` is `None`.
    /// Sheet names match exactly first, then ignoring case and surrounding
    /// whitespace.
    pub fn rows(&mut self, name: Option<&str>) -> Result<Vec<Row>, WorkbookError> {
        let entry = match name {
            Some(name) => self.find(name).cloned().ok_or_else(|| WorkbookError::MissingSheet {
                name: name.to_string(),
                available: self.sheet_names().join(", "),
            })?,
            None => self.sheets.first().cloned().ok_or_else(|| WorkbookError::MissingPart {
                part: "xl/worksheets/sheet1.xml".to_string(),
            })?,
        };
        let xml = read_zip_entry_bounded(&mut self.archive, &entry.part)?;
        read_sheet_rows(&xml, &self.shared_strings, &entry.part)
    }

    fn find(&self, name: &str) -> Option<&SheetEntry> {
        self.sheets.iter().find(|s| s.name == name).or_else(|| {
            let wanted = name.trim();
            self.sheets
                .iter()
                .find(|s| s.name.trim().eq_ignore_ascii_case(wanted))
        })
    }
}

fn read_zip_entry_bounded<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, WorkbookError> {
    let entry = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => WorkbookError::MissingPart {
            part: name.to_string(),
        },
        other => WorkbookError::Archive(other),
    })?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| WorkbookError::Xml {
            part: name.to_string(),
            message: e.to_string(),
        })?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(WorkbookError::PartTooLarge {
            part: name.to_string(),
            limit: MAX_XML_ENTRY_BYTES,
        });
    }
    Ok(out)
}

fn xml_error(part: &str, e: impl std::fmt::Display) -> WorkbookError {
    WorkbookError::Xml {
        part: part.to_string(),
        message: e.to_string(),
    }
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Shared string table; rich-text runs of one entry are concatenated.
fn read_shared_strings(xml: &[u8]) -> Result<Vec<String>, WorkbookError> {
    const PART: &str = "xl/sharedStrings.xml";
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    // phonetic runs (<rPh>) carry reading hints, not cell text
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::Text(te)) if in_t && !in_phonetic => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(|e| xml_error(PART, e))?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Sheet names and their part paths, in workbook order.
///
/// Falls back to the `xl/worksheets/sheetN.xml` naming convention when the
/// workbook part or its relationships are absent.
fn list_sheets<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<SheetEntry>, WorkbookError> {
    let declared = match read_zip_entry_bounded(archive, "xl/workbook.xml") {
        Ok(xml) => read_sheet_declarations(&xml)?,
        Err(WorkbookError::MissingPart { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };
    let targets = match read_zip_entry_bounded(archive, "xl/_rels/workbook.xml.rels") {
        Ok(xml) => read_relationships(&xml)?,
        Err(WorkbookError::MissingPart { .. }) => HashMap::new(),
        Err(e) => return Err(e),
    };

    if declared.is_empty() {
        let mut parts: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
            .map(|s| s.to_string())
            .collect();
        parts.sort_by_key(|name| sheet_number(name));
        return Ok(parts
            .into_iter()
            .map(|part| SheetEntry {
                name: part
                    .trim_start_matches("xl/worksheets/")
                    .trim_end_matches(".xml")
                    .to_string(),
                part,
            })
            .collect());
    }

    Ok(declared
        .into_iter()
        .enumerate()
        .map(|(idx, (name, rel_id))| {
            let part = rel_id
                .and_then(|id| targets.get(&id))
                .map(|target| resolve_target(target))
                .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", idx + 1));
            SheetEntry { name, part }
        })
        .collect())
}

fn sheet_number(part: &str) -> u32 {
    part.trim_start_matches("xl/worksheets/sheet")
        .trim_end_matches(".xml")
        .parse::<u32>()
        .unwrap_or(u32::MAX)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn read_sheet_declarations(xml: &[u8]) -> Result<Vec<(String, Option<String>)>, WorkbookError> {
    let mut out = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = attr(&e, b"name") {
                    out.push((name, attr(&e, b"id")));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/workbook.xml", e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn read_relationships(xml: &[u8]) -> Result<HashMap<String, String>, WorkbookError> {
    let mut out = HashMap::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    out.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/_rels/workbook.xml.rels", e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Split an `A1`-style reference into 0-based (row, column).
pub fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let letters_end = r.find(|c: char| !c.is_ascii_alphabetic())?;
    let (letters, digits) = r.split_at(letters_end);
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if col > MAX_COLUMNS {
            return None;
        }
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    Some((row - 1, col - 1))
}

#[derive(Default)]
struct PendingCell {
    col: usize,
    kind: Option<String>,
    value: String,
}

impl PendingCell {
    fn finish(self, shared: &[String]) -> Cell {
        let raw = self.value;
        match self.kind.as_deref() {
            Some("s") => raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i))
                .map(|s| Cell::Text(s.clone()))
                .unwrap_or(Cell::Empty),
            Some("b") => Cell::Bool(raw.trim() == "1"),
            Some("str") | Some("inlineStr") | Some("e") | Some("d") => Cell::Text(raw),
            _ => {
                if raw.trim().is_empty() {
                    Cell::Empty
                } else {
                    raw.trim()
                        .parse::<f64>()
                        .map(Cell::Number)
                        .unwrap_or(Cell::Text(raw))
                }
            }
        }
    }
}

fn place(rows: &mut Vec<Row>, row: usize, col: usize, cell: Cell) {
    if matches!(cell, Cell::Empty) {
        return;
    }
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, Cell::Empty);
    }
    cells[col] = cell;
}

/// Decode one worksheet into dense rows. Rows or cells without an explicit
/// reference continue from the previous one.
fn read_sheet_rows(xml: &[u8], shared: &[String], part: &str) -> Result<Vec<Row>, WorkbookError> {
    let mut rows: Vec<Row> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut row_idx: Option<usize> = None;
    let mut next_col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let idx = attr(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .filter(|r| *r >= 1 && *r <= MAX_ROWS)
                        .map(|r| r - 1)
                        .unwrap_or_else(|| row_idx.map_or(0, |r| r + 1));
                    row_idx = Some(idx);
                    next_col = 0;
                }
                b"c" => {
                    let col = attr(&e, b"r")
                        .and_then(|r| parse_cell_ref(&r))
                        .map(|(_, c)| c)
                        .unwrap_or(next_col);
                    cell = Some(PendingCell {
                        col,
                        kind: attr(&e, b"t"),
                        value: String::new(),
                    });
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let idx = attr(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .filter(|r| *r >= 1 && *r <= MAX_ROWS)
                        .map(|r| r - 1)
                        .unwrap_or_else(|| row_idx.map_or(0, |r| r + 1));
                    row_idx = Some(idx);
                }
                b"c" => {
                    next_col = attr(&e, b"r")
                        .and_then(|r| parse_cell_ref(&r))
                        .map_or(next_col, |(_, c)| c)
                        + 1;
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    c.value.push_str(&te.unescape().map_err(|e| xml_error(part, e))?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(done) = cell.take() {
                        let col = done.col;
                        next_col = col + 1;
                        place(&mut rows, row_idx.unwrap_or(0), col, done.finish(shared));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}
