//! Crawl driver
//!
//! Wires the configured probe, checkpoint store, record store, and
//! deduplicator into a [`CrawlRunner`] and runs one session. Multiple
//! sites run as separate processes (or separate runners), each with its
//! own probe instance and dedup index; they share only the output
//! directory, which is safe because collection filenames are
//! session-unique.

mod cancel;
mod runner;

pub use cancel::{cancel_on_ctrl_c, CancelToken};
pub use runner::CrawlRunner;

use crate::config::Config;
use crate::dedup::RecordDeduplicator;
use crate::output::{RecordStore, RunSummary};
use crate::pagination::DiscoverySettings;
use crate::probe::{build_probe_client, HttpProbe};
use crate::session::{CheckpointStore, ResumePolicy};
use crate::Result;
use chrono::Utc;

/// Runs one configured crawl session end to end.
///
/// # Arguments
///
/// * `config` - The session configuration
/// * `policy` - How to handle an existing checkpoint
/// * `cancel` - Cancellation token checked between page fetches
///
/// # Returns
///
/// * `Ok(RunSummary)` - Session completed or was cleanly interrupted
/// * `Err(SweepError)` - Startup resource acquisition failed
pub async fn crawl(config: Config, policy: ResumePolicy, cancel: CancelToken) -> Result<RunSummary> {
    let client = build_probe_client(&config.site.user_agent)?;
    let probe = HttpProbe::new(client, config.site.url_template.clone());

    let discovery = DiscoverySettings {
        step: config.pagination.step_size,
        ceiling: config.pagination.max_pages,
        probe_attempts: config.pagination.probe_retries,
    };

    let checkpoints = CheckpointStore::open(&config.output.checkpoint_dir)?;
    let records = RecordStore::open(&config.output.records_dir)?;

    let crawl_date = Utc::now().date_naive();
    let dedup = RecordDeduplicator::new(config.site.name.clone(), crawl_date)
        .with_min_body_length(config.dedup.min_body_length);

    let queries = config.queries.iter().map(|q| q.to_query()).collect();

    let mut runner = CrawlRunner::new(
        config.site.name.clone(),
        config.site.name.clone(),
        queries,
        probe,
        discovery,
        checkpoints,
        records,
        dedup,
        crawl_date,
        cancel,
    );
    runner.run(policy).await
}
