//! # Groundwater Corpus
//!
//! Batch ETL that turns published groundwater assessment workbooks into a
//! canonical record model and two retrieval corpora: flat metric facts with
//! generated sentences, and per-location narrative chunks.
//!
//! The pure transformation logic lives in [`groundwater_core`]; this crate
//! owns everything that touches the outside world.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │  Workbooks   │──▶│   Extract    │──▶│ records/*.json    │
//! │  data_dir    │   │ scan+decode  │   │ master.json       │
//! └──────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                                 │
//!                        ┌────────────────────────┤
//!                        ▼                        ▼
//!               ┌─────────────────┐     ┌──────────────────┐
//!               │ unified_dataset │     │ semantic_chunks  │
//!               │     .jsonl      │     │      .jsonl      │
//!               └─────────────────┘     └────────┬─────────┘
//!                                                ▼
//!                                        ┌──────────────┐
//!                                        │ gwc search   │
//!                                        │ (in-memory)  │
//!                                        └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gwc config-example > config/gwc.toml
//! gwc run                          # extract + facts + chunks
//! gwc stats
//! gwc search "over-exploited blocks in Punjab" --limit 5
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`discover`] | Workbook discovery and file-name parsing |
//! | [`workbook`] | XLSX worksheet reader |
//! | [`pipeline`] | Extract / facts / chunks stages |
//! | [`output`] | Intermediate and corpus file formats |
//! | [`progress`] | Console progress reporting |
//! | [`embedding`] | Embedding providers (Ollama) |
//! | [`search`] | Semantic search over chunks |
//! | [`stats`] | Output statistics |

pub mod config;
pub mod discover;
pub mod embedding;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod search;
pub mod stats;
pub mod workbook;
