//! Page probe boundary
//!
//! This module defines the seam between the core and the per-site
//! extraction layer:
//! - The [`PageProbe`] trait: given a (query, page) pair, report whether
//!   the page yields any valid records and return them
//! - Transient-failure classification and the bounded retry wrapper
//! - An HTTP reference adapter ([`HttpProbe`]) for sites that expose
//!   pre-extracted records as JSON
//!
//! The core assumes at most one in-flight probe per crawl session; each
//! session owns its own probe instance.

mod http;

pub use http::{build_probe_client, HttpProbe};

use crate::model::{Query, Record};
use thiserror::Error;

/// Default number of attempts per page before it is treated as invalid
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 3;

/// Transient failure of a single page probe.
///
/// Every variant is retryable; a failure that persists past the retry
/// budget is downgraded to "invalid page". A persistently failing page
/// is therefore indistinguishable from "no more pages"; callers cannot
/// tell the two apart.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Result of probing one page
#[derive(Debug, Default)]
pub struct ProbeReport {
    /// Records extracted from the page; empty means the page is invalid
    pub records: Vec<Record>,
}

impl ProbeReport {
    /// A report for a page with no records (absent or past the end)
    pub fn invalid() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// A page is valid when it yields at least one record
    pub fn is_valid(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Black-box existence/extraction check against one page of a paginated
/// result set.
///
/// Implementations are expected to have real latency and transient
/// failure characteristics; the core handles both.
#[allow(async_fn_in_trait)]
pub trait PageProbe {
    /// Probes one page of the query's result set
    async fn probe(&self, query: &Query, page: u32) -> Result<ProbeReport, ProbeError>;
}

/// Probes a page with bounded retries on transient failure.
///
/// Retries up to `max_attempts` times; once the budget is exhausted the
/// page is reported as invalid (zero records). Never returns an error.
pub async fn probe_with_retry<P: PageProbe>(
    probe: &P,
    query: &Query,
    page: u32,
    max_attempts: u32,
) -> ProbeReport {
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        match probe.probe(query, page).await {
            Ok(report) => return report,
            Err(e) => {
                if attempt < attempts {
                    tracing::warn!(
                        "Probe failed for {} page {} (attempt {}/{}): {}",
                        query,
                        page,
                        attempt,
                        attempts,
                        e
                    );
                } else {
                    tracing::warn!(
                        "Probe failed for {} page {} after {} attempts, treating page as invalid: {}",
                        query,
                        page,
                        attempts,
                        e
                    );
                }
            }
        }
    }
    ProbeReport::invalid()
}
