//! Pipeline progress reporting.
//!
//! Reports observable progress during `gwc extract`, `gwc facts`,
//! `gwc chunks` and `gwc search` so users see which workbook is being read
//! and how much is left. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

use serde::Serialize;

/// Derived-output stage, used in progress lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Facts,
    Chunks,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Facts => "facts",
            Stage::Chunks => "chunks",
        }
    }
}

/// A single progress event.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Walking the data directory. Total unknown.
    Discovering { data_dir: String },
    /// Reading workbook `n` of `total`.
    Extracting { file: String, n: u64, total: u64 },
    /// Deriving facts or chunks from intermediate document `n` of `total`.
    Deriving { stage: Stage, n: u64, total: u64 },
    /// `n` of `total` chunks embedded.
    Embedding { n: u64, total: u64 },
}

/// Reports pipeline progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the pipeline.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "extract  3 / 12 files  Annexure3_2022-23.xlsx".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Discovering { data_dir } => {
                format!("extract  discovering workbooks in {}...", data_dir)
            }
            ProgressEvent::Extracting { file, n, total } => {
                format!("extract  {}  {}", fraction(*n, *total, "files"), file)
            }
            ProgressEvent::Deriving { stage, n, total } => {
                format!("{}  {}", stage.as_str(), fraction(*n, *total, "documents"))
            }
            ProgressEvent::Embedding { n, total } => {
                format!("embed  {}", fraction(*n, *total, "chunks"))
            }
        };
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", line);
    }
}

fn fraction(n: u64, total: u64, noun: &str) -> String {
    format!("{} / {} {}", format_number(n), format_number(total), noun)
}

#[derive(Serialize)]
struct JsonLine<'e> {
    event: &'static str,
    #[serde(flatten)]
    detail: &'e ProgressEvent,
}

/// Machine-readable progress on stderr, one object per line:
/// `{"event":"progress","phase":"extracting","file":"...","n":3,"total":12}`.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let line = JsonLine {
            event: "progress",
            detail: &event,
        };
        if let Ok(text) = serde_json::to_string(&line) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", text);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// `1234567` → `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let lead = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Parse the `--progress` flag; `auto` picks by TTY.
    pub fn from_flag(flag: &str) -> anyhow::Result<Self> {
        match flag {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
                other
            ),
        }
    }

    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
