//! Adaptive pagination discovery
//!
//! Determines how many result pages exist for a query when the site
//! provides no total count, using staged exponential growth, binary
//! search refinement, and linear confirmation against a [`PageProbe`].
//!
//! [`PageProbe`]: crate::probe::PageProbe

mod discoverer;

pub use discoverer::{DiscoveryOutcome, DiscoverySettings, PaginationDiscoverer};
