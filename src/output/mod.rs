//! Output layer: record collections and run summaries
//!
//! Admitted records land in JSON collection files, one per
//! (site, query, date). Filenames are session-unique, which is what
//! makes the shared output directory safe for concurrent sessions
//! without locking.

mod report;
mod store;

pub use report::{print_run_summary, RunSummary};
pub use store::RecordStore;
