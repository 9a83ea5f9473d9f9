//! Last-page discovery over an unreliable probe
//!
//! The discovery runs in four phases:
//! 1. Bootstrap: probe page 1; invalid means the result set is empty
//! 2. Exponential expansion: probe multiples of the step size until an
//!    invalid page or the ceiling is reached
//! 3. Binary search between the last valid and first invalid probe
//! 4. Linear confirmation forward from the binary search result
//!
//! Assumption: page validity is eventually monotonic (once a page is
//! invalid, the site will not report later pages as valid). Real sites
//! with randomized result ordering can violate this; the retry wrapper
//! and the confirmation phase bound the damage but do not eliminate it.

use crate::model::Query;
use crate::probe::{probe_with_retry, PageProbe, DEFAULT_PROBE_ATTEMPTS};

/// Tuning knobs for one discovery run
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Step size for the exponential expansion phase
    pub step: u32,

    /// Hard ceiling on page numbers, guarding against misbehaving or
    /// infinite-seeming result sets
    pub ceiling: u32,

    /// Attempts per page probe before treating the page as invalid
    pub probe_attempts: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            step: 50,
            ceiling: 1000,
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
        }
    }
}

/// Result of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Page 1 had no records: the query matched nothing. Distinct from
    /// "one page of content".
    NoResults,

    /// The confirmed last valid page number
    LastPage(u32),

    /// The ceiling was reached without finding an invalid page; the
    /// value is a best-effort answer, not a confirmed last page
    Uncertain(u32),
}

impl DiscoveryOutcome {
    /// Number of pages to crawl for this outcome
    pub fn page_count(&self) -> u32 {
        match self {
            Self::NoResults => 0,
            Self::LastPage(n) | Self::Uncertain(n) => *n,
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, Self::Uncertain(_))
    }
}

/// Computes the last valid page number for a query.
///
/// Holds a reference to the session's probe; at most one probe call is
/// in flight at a time.
pub struct PaginationDiscoverer<'a, P: PageProbe> {
    probe: &'a P,
    settings: DiscoverySettings,
}

impl<'a, P: PageProbe> PaginationDiscoverer<'a, P> {
    pub fn new(probe: &'a P, settings: DiscoverySettings) -> Self {
        Self { probe, settings }
    }

    /// Runs the full discovery for one query.
    ///
    /// # Returns
    ///
    /// * `DiscoveryOutcome::NoResults` - page 1 yielded no records
    /// * `DiscoveryOutcome::LastPage(n)` - confirmed last valid page
    /// * `DiscoveryOutcome::Uncertain(n)` - ceiling hit; `n` is the
    ///   ceiling, reported as a best-effort answer
    pub async fn discover(&self, query: &Query) -> DiscoveryOutcome {
        let ceiling = self.settings.ceiling.max(1);
        // A step beyond the ceiling would skip the expansion phase
        // entirely and report everything as uncertain
        let step = self.settings.step.clamp(1, ceiling);

        // Phase 1: bootstrap check on page 1
        if !self.page_valid(query, 1).await {
            tracing::info!("Query {} has no results", query);
            return DiscoveryOutcome::NoResults;
        }

        // Phase 2: exponential expansion at step multiples
        let mut last_valid: u32 = 1;
        let mut first_invalid: Option<u32> = None;
        let mut page = step;
        while page <= ceiling {
            if self.page_valid(query, page).await {
                last_valid = page;
                page += step;
            } else {
                first_invalid = Some(page);
                break;
            }
        }

        let first_invalid = match first_invalid {
            Some(p) => p,
            None => {
                tracing::warn!(
                    "Query {} still valid at page ceiling {}, result is uncertain",
                    query,
                    ceiling
                );
                return DiscoveryOutcome::Uncertain(ceiling);
            }
        };

        tracing::debug!(
            "Expansion for {} bracketed the boundary in ({}, {}]",
            query,
            last_valid,
            first_invalid
        );

        // Phase 3: binary search in (last_valid, first_invalid).
        // Invariant: left is valid, right is invalid; the interval
        // shrinks every iteration, so termination is guaranteed for any
        // positive bounds.
        let mut left = last_valid;
        let mut right = first_invalid;
        while right - left > 1 {
            let mid = left + (right - left) / 2;
            if self.page_valid(query, mid).await {
                left = mid;
            } else {
                right = mid;
            }
        }
        let mut boundary = left;

        // Phase 4: linear confirmation. A transient failure during the
        // binary search can leave the boundary short; probe forward
        // until an invalid page confirms it.
        while boundary < ceiling {
            if self.page_valid(query, boundary + 1).await {
                boundary += 1;
            } else {
                break;
            }
        }

        if boundary >= ceiling {
            tracing::warn!(
                "Query {} confirmed valid up to the ceiling {}, result is uncertain",
                query,
                ceiling
            );
            return DiscoveryOutcome::Uncertain(ceiling);
        }

        tracing::info!("Query {} has {} pages", query, boundary);
        DiscoveryOutcome::LastPage(boundary)
    }

    async fn page_valid(&self, query: &Query, page: u32) -> bool {
        probe_with_retry(self.probe, query, page, self.settings.probe_attempts)
            .await
            .is_valid()
    }
}
