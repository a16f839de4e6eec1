//! Configuration parsing and validation.
//!
//! The pipeline is configured via a TOML file (default: `config/gwc.toml`).
//! Every section except `[paths]` may be omitted; missing keys fall back to
//! the defaults below.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! data_dir = "./data"
//! output_dir = "./output"
//!
//! [sources]
//! state_reports = ["**/stateReport*.xlsx"]
//! exclude_globs = ["**/~$*"]
//!
//! [facts]
//! keep_zero_values = false
//!
//! [embedding]
//! provider = "ollama"
//! model = "nomic-embed-text"
//! dims = 768
//! ```

use anyhow::{Context, Result};
use groundwater_core::chunks::ChunkOptions;
use groundwater_core::facts::FactOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub facts: FactsConfig,
    #[serde(default)]
    pub chunks: ChunksConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Directory holding the input workbooks.
    pub data_dir: PathBuf,
    /// Directory receiving intermediate records and derived corpora.
    pub output_dir: PathBuf,
}

/// File globs per report family, relative to `paths.data_dir`.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_state_reports")]
    pub state_reports: Vec<String>,
    #[serde(default = "default_central_reports")]
    pub central_reports: Vec<String>,
    #[serde(default = "default_annexure1")]
    pub annexure1: Vec<String>,
    #[serde(default = "default_annexure2")]
    pub annexure2: Vec<String>,
    #[serde(default = "default_annexure3")]
    pub annexure3: Vec<String>,
    #[serde(default = "default_annexure4")]
    pub annexure4: Vec<String>,
    #[serde(default = "default_attribute_reports")]
    pub attribute_reports: Vec<String>,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            state_reports: default_state_reports(),
            central_reports: default_central_reports(),
            annexure1: default_annexure1(),
            annexure2: default_annexure2(),
            annexure3: default_annexure3(),
            annexure4: default_annexure4(),
            attribute_reports: default_attribute_reports(),
            exclude_globs: default_exclude_globs(),
            follow_symlinks: false,
        }
    }
}

fn default_state_reports() -> Vec<String> {
    vec!["**/stateReport*.xlsx".to_string()]
}
fn default_central_reports() -> Vec<String> {
    vec!["**/CentralReport*.xlsx".to_string()]
}
fn default_annexure1() -> Vec<String> {
    vec!["**/Annexure1*.xlsx".to_string()]
}
fn default_annexure2() -> Vec<String> {
    vec!["**/Annexure2*.xlsx".to_string()]
}
fn default_annexure3() -> Vec<String> {
    vec!["**/Annexure3*.xlsx".to_string()]
}
fn default_annexure4() -> Vec<String> {
    vec!["**/Annexure4*.xlsx".to_string()]
}
fn default_attribute_reports() -> Vec<String> {
    vec!["**/attributeReport*.xlsx".to_string()]
}
fn default_exclude_globs() -> Vec<String> {
    // spreadsheet editors leave `~$name.xlsx` lock files next to open workbooks
    vec!["**/~$*".to_string()]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FactsConfig {
    #[serde(default)]
    pub keep_zero_values: bool,
}

impl FactsConfig {
    pub fn options(&self) -> FactOptions {
        FactOptions {
            keep_zero_values: self.keep_zero_values,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunksConfig {
    #[serde(default = "default_max_listed_units")]
    pub max_listed_units: usize,
    #[serde(default = "default_max_listed_quality_units")]
    pub max_listed_quality_units: usize,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            max_listed_units: default_max_listed_units(),
            max_listed_quality_units: default_max_listed_quality_units(),
        }
    }
}

fn default_max_listed_units() -> usize {
    10
}
fn default_max_listed_quality_units() -> usize {
    8
}

impl ChunksConfig {
    pub fn options(&self) -> ChunkOptions {
        ChunkOptions {
            max_listed_units: self.max_listed_units,
            max_listed_quality_units: self.max_listed_quality_units,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: default_url(),
            dims: None,
            batch_size: 32,
            max_retries: 5,
            timeout_secs: 60,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    60
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Complete example configuration, printed by `gwc config-example`.
pub const EXAMPLE_CONFIG: &str = r#"# groundwater-corpus configuration

[paths]
# Directory holding the published workbooks.
data_dir = "./data"
# Receives records/, all_reports_master.json, unified_dataset.jsonl
# and semantic_chunks.jsonl.
output_dir = "./output"

[sources]
# Globs are matched against paths relative to data_dir.
state_reports = ["**/stateReport*.xlsx"]
central_reports = ["**/CentralReport*.xlsx"]
annexure1 = ["**/Annexure1*.xlsx"]
annexure2 = ["**/Annexure2*.xlsx"]
annexure3 = ["**/Annexure3*.xlsx"]
annexure4 = ["**/Annexure4*.xlsx"]
attribute_reports = ["**/attributeReport*.xlsx"]
exclude_globs = ["**/~$*"]
follow_symlinks = false

[facts]
# Emit numeric facts whose value is zero.
keep_zero_values = false

[chunks]
# Unit names listed per category in stressed-unit chunks.
max_listed_units = 10
# Unit names listed per contaminant in quality-issue chunks.
max_listed_quality_units = 8

[embedding]
# "disabled" or "ollama"
provider = "disabled"
# model = "nomic-embed-text"
# dims = 768
url = "http://localhost:11434"
batch_size = 32
max_retries = 5
timeout_secs = 60
"#;

/// Read, parse and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content).with_context(|| "Failed to parse config file")?;

    // Relative paths are resolved against the config file's directory.
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.paths.data_dir = resolve(base, &config.paths.data_dir);
    config.paths.output_dir = resolve(base, &config.paths.output_dir);

    Ok(config)
}

/// Parse and validate configuration text without touching the filesystem.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunks
    if config.chunks.max_listed_units == 0 {
        anyhow::bail!("chunks.max_listed_units must be > 0");
    }
    if config.chunks.max_listed_quality_units == 0 {
        anyhow::bail!("chunks.max_listed_quality_units must be > 0");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be > 0");
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or ollama.",
            other
        ),
    }

    Ok(())
}
