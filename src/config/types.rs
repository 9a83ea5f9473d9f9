use crate::model::Query;
use serde::Deserialize;

/// Main configuration structure for one crawl session
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub queries: Vec<QueryEntry>,
}

/// The site boundary: where the probe points and how it identifies
/// itself
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site/session name; used as the record source, the checkpoint
    /// key, and the collection filename prefix
    pub name: String,

    /// Probe URL template with `{category}`, `{subcategory}`, and
    /// `{page}` placeholders
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// User agent sent with every probe request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    "sweepline/1.0".to_string()
}

/// Pagination discovery tuning
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    /// Step size for the exponential expansion phase
    #[serde(rename = "step-size", default = "default_step_size")]
    pub step_size: u32,

    /// Hard ceiling on page numbers
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Attempts per page probe before treating the page as invalid
    #[serde(rename = "probe-retries", default = "default_probe_retries")]
    pub probe_retries: u32,
}

fn default_step_size() -> u32 {
    50
}

fn default_max_pages() -> u32 {
    1000
}

fn default_probe_retries() -> u32 {
    3
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            max_pages: default_max_pages(),
            probe_retries: default_probe_retries(),
        }
    }
}

/// Deduplication thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Bodies shorter than this fall back to URL-based identity
    #[serde(rename = "min-body-length", default = "default_min_body_length")]
    pub min_body_length: usize,
}

fn default_min_body_length() -> usize {
    crate::dedup::DEFAULT_MIN_BODY_LENGTH
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_body_length: default_min_body_length(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for per-(site, query, date) record collections
    #[serde(rename = "records-dir")]
    pub records_dir: String,

    /// Directory for session checkpoints
    #[serde(rename = "checkpoint-dir")]
    pub checkpoint_dir: String,

    /// Where the unifier moves consumed inputs
    #[serde(rename = "archive-dir")]
    pub archive_dir: String,

    /// Consolidated master dataset path
    #[serde(rename = "master-path")]
    pub master_path: String,

    /// Reconciliation report path
    #[serde(rename = "report-path")]
    pub report_path: String,
}

/// One planned query: a (category, subcategory) pair
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEntry {
    pub category: String,
    pub subcategory: String,
}

impl QueryEntry {
    pub fn to_query(&self) -> Query {
        Query::new(self.category.clone(), self.subcategory.clone())
    }
}
