//! File-backed checkpoint persistence
//!
//! One human-readable JSON file per session name. Saves go through a
//! temp file in the same directory followed by a rename, so an
//! interruption mid-write can never leave a truncated checkpoint in
//! place of a good one. A checkpoint that fails to parse is treated as
//! absent and logged, never as a fatal error.

use crate::session::checkpoint::{CheckpointEnvelope, CrawlCheckpoint};
use crate::{Result, SweepError};
use std::fs;
use std::path::{Path, PathBuf};

/// Checkpoint store keyed by session name over a directory
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// Failure to create the directory is one of the few fatal startup
    /// errors in the crate.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            SweepError::Checkpoint(format!(
                "cannot create checkpoint directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// Path of the checkpoint file for a session name
    pub fn path_for(&self, session_name: &str) -> PathBuf {
        self.dir.join(format!("{}.checkpoint.json", session_name))
    }

    /// Loads the persisted checkpoint for a session.
    ///
    /// Returns `None` when the file is absent or unreadable; a corrupt
    /// checkpoint is logged as a warning and the crawl restarts fresh.
    pub fn load(&self, session_name: &str) -> Option<CheckpointEnvelope> {
        let path = self.path_for(session_name);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    "Failed to read checkpoint {}: {}, starting fresh",
                    path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str::<CheckpointEnvelope>(&content) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(
                    "Corrupt checkpoint {}: {}, treating as absent",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Atomically overwrites the persisted checkpoint for a session
    pub fn save(&self, session_name: &str, checkpoint: &CrawlCheckpoint) -> Result<()> {
        let envelope = CheckpointEnvelope::new(session_name, checkpoint.clone());
        let path = self.path_for(session_name);
        let content = serde_json::to_string_pretty(&envelope)?;
        write_atomic(&path, content.as_bytes())?;
        tracing::debug!("Saved checkpoint for {}: {}", session_name, checkpoint.summary());
        Ok(())
    }

    /// Deletes the checkpoint; called only after the crawl reaches its
    /// terminal completed state (or the operator declines resumption)
    pub fn clear(&self, session_name: &str) -> Result<()> {
        let path = self.path_for(session_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SweepError::Io(e)),
        }
    }
}

/// Writes a file through a temp sibling plus rename.
///
/// The temp file lands in the same directory as the target so the
/// rename stays on one filesystem.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
