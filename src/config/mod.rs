//! Configuration loading and validation
//!
//! Configuration is a TOML file with kebab-case keys describing one
//! crawl session: the site boundary (probe URL template), pagination
//! tuning, dedup thresholds, output locations, and the planned query
//! sequence.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, DedupConfig, OutputConfig, PaginationConfig, QueryEntry, SiteConfig,
};
pub use validation::validate;
