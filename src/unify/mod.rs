//! Batch reconciliation of partial crawl outputs
//!
//! The unifier reads every partial record collection a set of sessions
//! produced, feeds each record through one deduplicator in a
//! deterministic order, and writes one consolidated dataset plus a
//! machine-readable reconciliation report. Consumed inputs are moved to
//! an archive directory, never deleted. A separate repair mode re-runs
//! deduplication over an already-consolidated dataset behind a
//! backup-before-mutate guard.

mod repair;
mod unifier;

pub use repair::{repair, RepairReport, RepairSettings};
pub use unifier::{unify, ReconciliationReport, UnifyOutcome, UnifySettings};
