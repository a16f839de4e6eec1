//! Deterministic content identity for facts and chunks.
//!
//! An identity is the SHA-256 of the parts joined with `|`, hex encoded and
//! truncated. Absent parts are replaced by [`NULL_PART`] before joining so
//! that an absent district and an absent block sit in distinct positions
//! and never collapse onto each other. The function is pure and
//! order-sensitive; these IDs are the primary keys used by the vector store.

use sha2::{Digest, Sha256};

/// Placeholder for an absent or empty part.
pub const NULL_PART: &str = "_NULL_";
/// Hex length of chunk identities.
pub const CHUNK_ID_LEN: usize = 16;
/// Hex length of fact identities.
pub const FACT_ID_LEN: usize = 12;

/// Hash `parts` into a hex identity of `len` characters (max 64).
pub fn content_id(parts: &[Option<&str>], len: usize) -> String {
    let joined = parts
        .iter()
        .map(|p| match p {
            Some(s) if !s.is_empty() => *s,
            _ => NULL_PART,
        })
        .collect::<Vec<_>>()
        .join("|");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(len.min(64));
    hex
}

/// Identity of a semantic chunk.
pub fn chunk_id(parts: &[Option<&str>]) -> String {
    content_id(parts, CHUNK_ID_LEN)
}

/// Identity of a metric fact.
pub fn fact_id(parts: &[Option<&str>]) -> String {
    content_id(parts, FACT_ID_LEN)
}
