//! Input discovery.
//!
//! Walks `paths.data_dir` with `walkdir`, matches relative paths against the
//! per-family globs of `[sources]` with `globset`, and derives the reporting
//! year (and, for state reports, the state) from each file name.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use groundwater_core::models::SourceType;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::Config;

/// A group of workbooks sharing one published layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    StateReports,
    CentralReports,
    Annexure1,
    Annexure2,
    Annexure3,
    Annexure4,
    AttributeReports,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Self::StateReports,
        Self::CentralReports,
        Self::Annexure1,
        Self::Annexure2,
        Self::Annexure3,
        Self::Annexure4,
        Self::AttributeReports,
    ];

    /// Config key under `[sources]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateReports => "state_reports",
            Self::CentralReports => "central_reports",
            Self::Annexure1 => "annexure1",
            Self::Annexure2 => "annexure2",
            Self::Annexure3 => "annexure3",
            Self::Annexure4 => "annexure4",
            Self::AttributeReports => "attribute_reports",
        }
    }

    /// Sheets decoded from one workbook of this family, in order.
    pub fn source_types(&self) -> &'static [SourceType] {
        match self {
            Self::StateReports => &[SourceType::StateReport],
            Self::CentralReports => &[SourceType::CentralReport],
            Self::Annexure1 => &[SourceType::Annexure1],
            Self::Annexure2 => &[SourceType::Annexure2],
            Self::Annexure3 => &[
                SourceType::Annexure3a,
                SourceType::Annexure3b,
                SourceType::Annexure3c,
                SourceType::Annexure3d,
                SourceType::Annexure3e,
                SourceType::Annexure3f,
            ],
            Self::Annexure4 => &[SourceType::Annexure4a, SourceType::Annexure4b],
            Self::AttributeReports => &[SourceType::AttributeSummary, SourceType::AttributeDetailed],
        }
    }

    fn patterns<'c>(&self, config: &'c Config) -> &'c [String] {
        let s = &config.sources;
        match self {
            Self::StateReports => &s.state_reports,
            Self::CentralReports => &s.central_reports,
            Self::Annexure1 => &s.annexure1,
            Self::Annexure2 => &s.annexure2,
            Self::Annexure3 => &s.annexure3,
            Self::Annexure4 => &s.annexure4,
            Self::AttributeReports => &s.attribute_reports,
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One workbook selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub family: Family,
    pub path: PathBuf,
    /// Path relative to the data directory, `/`-separated.
    pub relative: String,
    pub year: String,
    /// State named by the file; state reports only.
    pub state: Option<String>,
}

/// Find every workbook under `data_dir`, sorted by relative path.
///
/// A file matching several families is assigned to the first one in
/// [`Family::ALL`] order.
pub fn discover(config: &Config) -> Result<Vec<SourceFile>> {
    let root = &config.paths.data_dir;
    if !root.exists() {
        bail!("Data directory does not exist: {}", root.display());
    }

    let mut families = Vec::with_capacity(Family::ALL.len());
    for family in Family::ALL {
        families.push((family, build_globset(family.patterns(config))?));
    }
    let exclude_set = build_globset(&config.sources.exclude_globs)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(config.sources.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        let Some(family) = families
            .iter()
            .find(|(_, set)| set.is_match(&rel_str))
            .map(|(family, _)| *family)
        else {
            continue;
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let state = match family {
            Family::StateReports => state_from_filename(&file_name),
            _ => None,
        };

        files.push(SourceFile {
            family,
            path: path.to_path_buf(),
            relative: rel_str,
            year: year_from_filename(&file_name),
            state,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn year_regex() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"(\d{4})[-_]?(\d{2,4})").expect("year pattern is valid"))
}

/// Reporting year from a file name: `CentralReport2021-22.xlsx` gives
/// `2021-2022`; no year gives `unknown`.
pub fn year_from_filename(name: &str) -> String {
    match year_regex().captures(name) {
        Some(caps) => {
            let start = &caps[1];
            let end = &caps[2];
            if end.len() == 2 {
                format!("{}-20{}", start, end)
            } else {
                format!("{}-{}", start, end)
            }
        }
        None => "unknown".to_string(),
    }
}

/// State named by a state-report file name: `stateReportTamilNadu2024-25.xlsx`
/// gives `Tamil Nadu`.
pub fn state_from_filename(name: &str) -> Option<String> {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let stripped = stem.replace("stateReport", "").replace("Hydro", "");
    let stripped = year_regex().replace_all(&stripped, " ");

    let mut out = String::with_capacity(stripped.len() + 4);
    let mut prev: Option<char> = None;
    for c in stripped.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase()) {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }

    let state = out.split_whitespace().collect::<Vec<_>>().join(" ");
    if state.is_empty() {
        None
    } else {
        Some(state)
    }
}
