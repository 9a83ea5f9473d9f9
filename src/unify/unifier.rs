//! Consolidation of partial collections into one master dataset
//!
//! Processing order is the sorted order of input file names, then array
//! order within each file. The order is load-bearing: it decides which
//! metadata variant of a duplicated posting survives, so it must be
//! deterministic across runs.

use crate::dedup::RecordDeduplicator;
use crate::model::Record;
use crate::session::write_atomic;
use crate::{Result, SweepError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one unify run
#[derive(Debug, Clone)]
pub struct UnifySettings {
    /// Inputs smaller than this many bytes are rejected as suspicious
    pub min_input_bytes: u64,

    /// Where consumed inputs are moved after successful processing
    pub archive_dir: PathBuf,

    /// Consolidated dataset destination
    pub output_path: PathBuf,

    /// Reconciliation report destination
    pub report_path: PathBuf,
}

impl UnifySettings {
    /// Default byte threshold below which an input cannot plausibly
    /// hold a record list
    pub const DEFAULT_MIN_INPUT_BYTES: u64 = 16;
}

/// Machine-readable summary of one unify run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub timestamp: DateTime<Utc>,
    pub total_read: u64,
    pub duplicates_removed: u64,
    pub unique_records: u64,
    pub duplicates_by_source: BTreeMap<String, u64>,
    pub files_processed: Vec<String>,
    pub files_skipped: Vec<String>,
}

/// What a unify run produced
#[derive(Debug)]
pub struct UnifyOutcome {
    pub output_path: PathBuf,
    pub report: ReconciliationReport,
}

/// Merges partial record collections into one deduplicated dataset.
///
/// # Behavior
///
/// 1. Inputs that are not a record list, are empty, or fall below the
///    byte threshold are logged, counted as skipped, and do not abort
///    the run
/// 2. Inputs are processed in sorted file-name order; every record goes
///    through the deduplicator and only admitted records enter the
///    output set
/// 3. The consolidated dataset and the reconciliation report are
///    written, then successfully processed inputs are moved to the
///    archive directory
///
/// # Arguments
///
/// * `input_paths` - Partial collection files to consolidate
/// * `settings` - Thresholds and destinations
/// * `dedup` - The deduplicator owning this run's index
pub fn unify(
    input_paths: &[PathBuf],
    settings: &UnifySettings,
    dedup: &mut RecordDeduplicator,
) -> Result<UnifyOutcome> {
    fs::create_dir_all(&settings.archive_dir).map_err(|e| {
        SweepError::RecordStore(format!(
            "cannot create archive directory {}: {}",
            settings.archive_dir.display(),
            e
        ))
    })?;

    let mut inputs: Vec<PathBuf> = input_paths.to_vec();
    inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut consolidated: Vec<Record> = Vec::new();
    let mut total_read: u64 = 0;
    let mut files_processed: Vec<String> = Vec::new();
    let mut files_skipped: Vec<String> = Vec::new();
    let mut processed_paths: Vec<PathBuf> = Vec::new();

    for path in &inputs {
        let name = display_name(path);
        let records = match read_record_list(path, settings.min_input_bytes) {
            Ok(records) => records,
            Err(reason) => {
                tracing::warn!("Skipping input {}: {}", name, reason);
                files_skipped.push(name);
                continue;
            }
        };

        tracing::info!("Processing {} ({} records)", name, records.len());
        for mut record in records {
            total_read += 1;
            let admission = dedup.admit(&mut record);
            if admission.is_new {
                consolidated.push(record);
            }
        }
        files_processed.push(name);
        processed_paths.push(path.clone());
    }

    let stats = dedup.stats().clone();
    let report = ReconciliationReport {
        timestamp: Utc::now(),
        total_read,
        duplicates_removed: stats.duplicates,
        unique_records: consolidated.len() as u64,
        duplicates_by_source: stats.duplicates_by_source,
        files_processed,
        files_skipped,
    };

    // Outputs first, then archive: a crash between the two leaves the
    // inputs in place for a rerun rather than stranding them
    write_atomic(
        &settings.output_path,
        serde_json::to_string_pretty(&consolidated)?.as_bytes(),
    )?;
    write_atomic(
        &settings.report_path,
        serde_json::to_string_pretty(&report)?.as_bytes(),
    )?;

    for path in &processed_paths {
        archive_input(path, &settings.archive_dir);
    }

    tracing::info!(
        "Unified {} records into {} unique ({} duplicates removed, {} files skipped)",
        report.total_read,
        report.unique_records,
        report.duplicates_removed,
        report.files_skipped.len()
    );

    Ok(UnifyOutcome {
        output_path: settings.output_path.clone(),
        report,
    })
}

/// Reads and shape-checks one input file; the error string is the skip
/// reason
fn read_record_list(path: &Path, min_bytes: u64) -> std::result::Result<Vec<Record>, String> {
    let metadata = fs::metadata(path).map_err(|e| format!("cannot stat: {}", e))?;
    if metadata.len() < min_bytes {
        return Err(format!(
            "suspiciously small ({} bytes, minimum {})",
            metadata.len(),
            min_bytes
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| format!("cannot read: {}", e))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| format!("not valid JSON: {}", e))?;

    if !value.is_array() {
        return Err("not a record list".to_string());
    }

    let records: Vec<Record> =
        serde_json::from_value(value).map_err(|e| format!("unexpected record shape: {}", e))?;

    if records.is_empty() {
        return Err("empty record list".to_string());
    }

    Ok(records)
}

/// Moves a consumed input to the archive directory. Rename first, with
/// a copy-and-remove fallback for archive directories on another
/// filesystem. Archive failures are logged, never escalated.
fn archive_input(path: &Path, archive_dir: &Path) {
    let Some(file_name) = path.file_name() else {
        return;
    };
    let target = archive_dir.join(file_name);
    if fs::rename(path, &target).is_ok() {
        return;
    }
    match fs::copy(path, &target).and_then(|_| fs::remove_file(path)) {
        Ok(()) => {}
        Err(e) => {
            tracing::warn!(
                "Failed to archive {} to {}: {}",
                path.display(),
                target.display(),
                e
            );
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
