//! JSON record collection store
//!
//! One collection file per (site, query, date). Appending merges new
//! records into any pre-existing same-named collection through the
//! temp-plus-rename write used everywhere else; collections are never
//! wholesale overwritten except by the unifier's explicit rewrite.

use crate::model::{Query, Record};
use crate::session::write_atomic;
use crate::{Result, SweepError};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Record collection store over an output directory
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// Failure to create the output directory is a fatal startup error.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            SweepError::RecordStore(format!(
                "cannot create output directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filename for a (site, query, date) collection
    pub fn collection_name(site: &str, query: &Query, date: NaiveDate) -> String {
        format!(
            "{}__{}-{}__{}.json",
            sanitize(site),
            sanitize(&query.category),
            sanitize(&query.subcategory),
            date.format("%Y%m%d")
        )
    }

    /// Full path for a (site, query, date) collection
    pub fn collection_path(&self, site: &str, query: &Query, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::collection_name(site, query, date))
    }

    /// Loads a collection; an absent file is an empty collection
    pub fn load(&self, path: &Path) -> Result<Vec<Record>> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SweepError::Io(e)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Merges new records into a collection and rewrites it atomically.
    ///
    /// # Returns
    ///
    /// Total number of records in the collection after the merge.
    pub fn append(&self, path: &Path, new_records: &[Record]) -> Result<usize> {
        let mut records = self.load(path)?;
        records.extend_from_slice(new_records);
        self.write(path, &records)?;
        Ok(records.len())
    }

    /// Rewrites a collection wholesale. Only the unifier and the
    /// repair path use this directly.
    pub fn write(&self, path: &Path, records: &[Record]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        write_atomic(path, content.as_bytes())?;
        Ok(())
    }

    /// All collection files in the store, sorted by file name so batch
    /// consumers get a deterministic order
    pub fn list_collections(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Replaces filesystem-hostile characters in name components
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
