//! End-of-run reporting
//!
//! Collects the per-phase counters the crawl loop accumulates and
//! prints them at the end of a session, so no absorbed failure vanishes
//! silently.

use crate::dedup::DedupStats;

/// Counters for one crawl session
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Queries in the crawl plan
    pub queries_planned: usize,

    /// Queries fully crawled this run
    pub queries_completed: usize,

    /// Queries whose page 1 had no records
    pub queries_no_results: usize,

    /// Queries whose pagination hit the ceiling (uncertain last page)
    pub queries_uncertain: usize,

    /// Pages fetched across all queries
    pub pages_crawled: u64,

    /// Records read from probes before deduplication
    pub records_read: u64,

    /// True when the session was interrupted before finishing the plan
    pub aborted: bool,
}

/// Prints the session summary to stdout in the same shape the unify
/// report uses
pub fn print_run_summary(session: &str, summary: &RunSummary, dedup: &DedupStats) {
    println!("=== Crawl Summary: {} ===\n", session);

    println!("Queries:");
    println!("  Planned: {}", summary.queries_planned);
    println!("  Completed: {}", summary.queries_completed);
    if summary.queries_no_results > 0 {
        println!("  No results: {}", summary.queries_no_results);
    }
    if summary.queries_uncertain > 0 {
        println!("  Uncertain page count: {}", summary.queries_uncertain);
    }
    println!();

    println!("Records:");
    println!("  Pages crawled: {}", summary.pages_crawled);
    println!("  Read: {}", summary.records_read);
    println!("  Admitted: {}", dedup.admitted);
    println!("  Duplicates dropped: {}", dedup.duplicates);

    if !dedup.duplicates_by_source.is_empty() {
        println!("\nDuplicates by source:");
        for (source, count) in &dedup.duplicates_by_source {
            println!("  {}: {}", source, count);
        }
    }

    if summary.aborted {
        println!("\nSession was interrupted; progress checkpoint saved.");
    }
}
