//! Content fingerprinting
//!
//! A fingerprint is the SHA-256 digest of a record's normalized body
//! text. When the body is absent or too short to be a meaningful key,
//! the record's URL is digested instead; when both are missing, a
//! synthetic value derived from the record's sequence index is used as
//! a last resort. Which input was used is reported so downstream
//! consumers can treat synthetic identities as low-confidence.

use crate::model::{Fingerprint, IdentityBasis, Record};
use sha2::{Digest, Sha256};

/// Bodies shorter than this (after normalization) fall back to the URL
pub const DEFAULT_MIN_BODY_LENGTH: usize = 32;

/// Collapses all whitespace runs to single spaces and trims.
///
/// `"Senior\nDeveloper  needed"` and `"Senior Developer needed"`
/// normalize identically, so formatting differences between sources do
/// not defeat deduplication.
pub fn normalize_body(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Computes a record's fingerprint and reports the identity basis used.
///
/// Pure with respect to record content: the same normalized input
/// always produces the same digest. `sequence` only participates on the
/// synthetic path.
pub fn compute_fingerprint(
    record: &Record,
    sequence: u64,
    min_body_length: usize,
) -> (Fingerprint, IdentityBasis) {
    if let Some(body) = record.body.as_deref() {
        let normalized = normalize_body(body);
        if normalized.len() >= min_body_length {
            return (digest(&normalized), IdentityBasis::Body);
        }
    }

    if let Some(url) = record.url.as_deref() {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            return (digest(trimmed), IdentityBasis::Url);
        }
    }

    // Last resort: no usable content at all
    (
        digest(&format!("synthetic:{}", sequence)),
        IdentityBasis::Synthetic,
    )
}

fn digest(input: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    Fingerprint::from_hex(hex::encode(hasher.finalize()))
}
