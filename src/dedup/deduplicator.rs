//! First-seen-wins deduplication over a fingerprint index
//!
//! The index maps fingerprints to the canonical identifier assigned on
//! first admission. It is owned exclusively by one deduplicator per run
//! (streaming or batch), rebuilt at run start, and discarded at process
//! end. Cross-session duplicate suppression happens at the unify stage,
//! not live.

use crate::dedup::fingerprint::{compute_fingerprint, DEFAULT_MIN_BODY_LENGTH};
use crate::model::{CanonicalId, Fingerprint, IdentityBasis, Record};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Outcome of admitting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// True when this fingerprint was seen for the first time
    pub is_new: bool,

    /// The canonical identifier for this content (newly assigned or the
    /// first-seen one)
    pub canonical_id: CanonicalId,
}

/// Running counters for end-of-phase reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub admitted: u64,
    pub duplicates: u64,
    pub duplicates_by_source: BTreeMap<String, u64>,
}

/// Assigns stable identities and drops duplicate records.
///
/// Tie-break policy: when two records share a fingerprint, the first
/// one admitted in processing order wins and later arrivals are dropped
/// entirely; fields are never merged. Batch callers are responsible for
/// a deterministic processing order.
pub struct RecordDeduplicator {
    source: String,
    crawl_date: NaiveDate,
    min_body_length: usize,
    index: HashMap<Fingerprint, CanonicalId>,
    stats: DedupStats,
    sequence: u64,
}

impl RecordDeduplicator {
    pub fn new(source: impl Into<String>, crawl_date: NaiveDate) -> Self {
        Self {
            source: source.into(),
            crawl_date,
            min_body_length: DEFAULT_MIN_BODY_LENGTH,
            index: HashMap::new(),
            stats: DedupStats::default(),
            sequence: 0,
        }
    }

    pub fn with_min_body_length(mut self, min_body_length: usize) -> Self {
        self.min_body_length = min_body_length;
        self
    }

    /// Re-keys identity assignment to another date. A resumed session
    /// calls this with the interrupted run's date so canonical
    /// identifiers stay consistent with what was already flushed.
    pub fn set_crawl_date(&mut self, crawl_date: NaiveDate) {
        self.crawl_date = crawl_date;
    }

    /// Computes the fingerprint for a record without admitting it
    pub fn fingerprint(&self, record: &Record) -> (Fingerprint, IdentityBasis) {
        compute_fingerprint(record, self.sequence, self.min_body_length)
    }

    /// Admits a record: first-seen records get a canonical identifier
    /// written onto them, duplicates are reported for the caller to
    /// drop.
    ///
    /// A fingerprint already present on the record is trusted (the
    /// unify path computes them up front); otherwise one is computed
    /// and assigned along with its identity basis.
    pub fn admit(&mut self, record: &mut Record) -> Admission {
        let fingerprint = match record.fingerprint.clone() {
            Some(fp) => fp,
            None => {
                let (fp, basis) = compute_fingerprint(record, self.sequence, self.min_body_length);
                record.fingerprint = Some(fp.clone());
                record.identity_basis = Some(basis);
                if basis == IdentityBasis::Synthetic {
                    tracing::warn!(
                        "Record #{} has neither body nor url, assigned synthetic identity",
                        self.sequence
                    );
                }
                fp
            }
        };
        self.sequence += 1;

        if let Some(existing) = self.index.get(&fingerprint) {
            self.stats.duplicates += 1;
            *self
                .stats
                .duplicates_by_source
                .entry(record.source_label().to_string())
                .or_insert(0) += 1;
            return Admission {
                is_new: false,
                canonical_id: existing.clone(),
            };
        }

        let canonical_id = CanonicalId::derive(&self.source, self.crawl_date, &fingerprint);
        record.id = Some(canonical_id.clone());
        self.index.insert(fingerprint, canonical_id.clone());
        self.stats.admitted += 1;

        Admission {
            is_new: true,
            canonical_id,
        }
    }

    /// Rebuilds the index from previously flushed records, so a resumed
    /// streaming session does not re-admit what it already wrote.
    ///
    /// Seeded records count as already admitted but do not touch the
    /// stats counters for this run.
    pub fn seed(&mut self, records: &[Record]) {
        for record in records {
            let fingerprint = match record.fingerprint.clone() {
                Some(fp) => fp,
                None => {
                    let (fp, _) = compute_fingerprint(record, self.sequence, self.min_body_length);
                    fp
                }
            };
            self.sequence += 1;
            if let Some(id) = record.id.clone() {
                self.index.entry(fingerprint).or_insert(id);
            } else {
                let id = CanonicalId::derive(&self.source, self.crawl_date, &fingerprint);
                self.index.entry(fingerprint).or_insert(id);
            }
        }
    }

    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }

    /// Number of distinct fingerprints seen so far
    pub fn index_len(&self) -> usize {
        self.index.len()
    }
}
