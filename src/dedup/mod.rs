//! Content-addressed deduplication and identity assignment
//!
//! Collapses near-duplicate postings (the same content scraped from
//! multiple categories, pages, or sources) into one canonical record
//! with a stable identifier. Used in streaming mode during a crawl and
//! in batch mode by the unifier.

mod deduplicator;
mod fingerprint;

pub use deduplicator::{Admission, DedupStats, RecordDeduplicator};
pub use fingerprint::{compute_fingerprint, normalize_body, DEFAULT_MIN_BODY_LENGTH};
