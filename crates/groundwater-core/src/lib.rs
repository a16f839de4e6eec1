//! # Groundwater Core
//!
//! Pure transformation logic for groundwater assessment workbooks: cell
//! coercion, sectioned table scanning, per-family schema decoding into a
//! canonical record model, content identity, metric facts and semantic
//! chunks, plus the embedding and vector store seams.
//!
//! This crate performs no filesystem or network I/O. Workbook reading,
//! configuration and output writing live in the `groundwater-corpus`
//! application crate.
//!
//! ```text
//! rows ─▶ scanner ─▶ schema ─▶ SourceDocument ─┬─▶ facts
//!                                              └─▶ chunks
//! ```

pub mod chunks;
pub mod coerce;
pub mod embedding;
pub mod facts;
pub mod identity;
pub mod models;
pub mod names;
pub mod scanner;
pub mod schema;
pub mod store;
