//! Sweepline: a job-listing crawl consolidator
//!
//! This crate implements the shared core of a multi-site job-listing
//! crawler: adaptive pagination discovery, resumable crawl sessions,
//! content-addressed deduplication, and batch reconciliation of partial
//! crawl outputs into one master dataset. Site-specific extraction is
//! supplied externally through the [`probe::PageProbe`] boundary.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod model;
pub mod output;
pub mod pagination;
pub mod probe;
pub mod session;
pub mod unify;

use thiserror::Error;

/// Main error type for Sweepline operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint store error: {0}")]
    Checkpoint(String),

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("Backup failed before mutation of {path}: {message}")]
    BackupFailed { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL template in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sweepline operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use dedup::RecordDeduplicator;
pub use model::{CanonicalId, Fingerprint, IdentityBasis, Query, Record};
pub use pagination::{DiscoveryOutcome, PaginationDiscoverer};
pub use session::{CheckpointStore, CrawlCheckpoint, ResumePolicy};
pub use unify::{unify, ReconciliationReport};
