//! Resumable crawl session state
//!
//! This module holds everything needed to interrupt and resume a
//! long-running multi-query crawl:
//! - [`CrawlCheckpoint`]: position, completed-set, and counters
//! - [`CheckpointStore`]: atomic load/save/clear over a checkpoint file
//! - [`ResumePolicy`]: how the resume/no-resume decision is made
//! - [`SessionPhase`]: the session lifecycle state machine

mod checkpoint;
mod resume;
mod store;

pub use checkpoint::{CheckpointEnvelope, CrawlCheckpoint, SessionPhase};
pub use resume::ResumePolicy;
pub use store::CheckpointStore;

pub(crate) use store::write_atomic;
