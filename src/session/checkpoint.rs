//! Checkpoint data structures and session lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Resumable progress for one crawl run.
///
/// Overwritten after every completed page or query; deleted only when
/// the planned query sequence completes. The in-memory record buffer is
/// allowed to be lost on abrupt termination, this position is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    /// Date the run started. Collections and canonical identifiers are
    /// keyed by it, so a resume after midnight must restore it rather
    /// than take the resume day's date.
    pub crawl_date: NaiveDate,

    /// Position in the planned query sequence
    pub query_index: usize,

    /// Page currently being crawled within that query (1-based)
    pub current_page: u32,

    /// Identifiers of queries already fully crawled
    pub completed_queries: BTreeSet<String>,

    /// Cumulative count of records admitted so far
    pub records_collected: u64,

    /// True once the checkpoint has been offered for resumption
    pub resume: bool,
}

impl CrawlCheckpoint {
    /// A checkpoint at the start of a fresh crawl
    pub fn fresh(crawl_date: NaiveDate) -> Self {
        Self {
            crawl_date,
            query_index: 0,
            current_page: 1,
            completed_queries: BTreeSet::new(),
            records_collected: 0,
            resume: false,
        }
    }

    /// Marks a query as completed and advances the sequence position
    pub fn complete_query(&mut self, query_id: &str) {
        self.completed_queries.insert(query_id.to_string());
        self.query_index += 1;
        self.current_page = 1;
    }

    /// One-line summary shown when offering resumption
    pub fn summary(&self) -> String {
        format!(
            "{} queries completed, position {} page {}, {} records collected",
            self.completed_queries.len(),
            self.query_index,
            self.current_page,
            self.records_collected
        )
    }
}

/// On-disk envelope around a checkpoint: which session it belongs to
/// and when it was written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    pub session_name: String,
    pub timestamp: DateTime<Utc>,
    pub data: CrawlCheckpoint,
}

impl CheckpointEnvelope {
    pub fn new(session_name: impl Into<String>, data: CrawlCheckpoint) -> Self {
        Self {
            session_name: session_name.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Lifecycle of one crawl session:
/// `Fresh -> Running -> {Checkpointed <-> Running} -> Completed | Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, nothing crawled yet
    Fresh,

    /// Actively probing and collecting
    Running,

    /// Progress persisted at a page or query boundary
    Checkpointed,

    /// All planned queries finished; checkpoint cleared
    Completed,

    /// Interrupted; a final checkpoint save was attempted
    Aborted,
}

impl SessionPhase {
    /// Terminal phases accept no further work
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Running => "running",
            Self::Checkpointed => "checkpointed",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}
