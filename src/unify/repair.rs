//! In-place repair of an already-consolidated dataset
//!
//! Re-runs deduplication over a dataset produced by an earlier run
//! (for instance one consolidated before a fingerprinting fix) and
//! rewrites it in place. Destructive-operation guard: a timestamped
//! backup copy is written before any mutation, and a failed backup
//! aborts the repair with the original untouched. Dry-run is the
//! default; mutation requires an explicit opt-in.

use crate::dedup::RecordDeduplicator;
use crate::model::Record;
use crate::session::write_atomic;
use crate::{Result, SweepError};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one repair run
#[derive(Debug, Clone, Default)]
pub struct RepairSettings {
    /// False (the default) reports what would change without mutating
    pub apply: bool,

    /// Where the backup copy goes; defaults to the dataset's directory
    pub backup_dir: Option<PathBuf>,
}

/// What a repair run found and did
#[derive(Debug, Clone)]
pub struct RepairReport {
    pub records_before: u64,
    pub records_after: u64,
    pub duplicates_removed: u64,

    /// Backup location when the dataset was rewritten
    pub backup_path: Option<PathBuf>,

    /// True when the dataset was actually rewritten
    pub applied: bool,
}

/// Re-deduplicates a consolidated dataset in place.
///
/// Idempotent: repairing an already-clean dataset removes nothing, so
/// running it twice is safe.
///
/// # Arguments
///
/// * `dataset` - Path to the consolidated record list
/// * `settings` - Dry-run/apply switch and backup destination
/// * `dedup` - Deduplicator owning this run's index
pub fn repair(
    dataset: &Path,
    settings: &RepairSettings,
    dedup: &mut RecordDeduplicator,
) -> Result<RepairReport> {
    let content = fs::read_to_string(dataset)?;
    let records: Vec<Record> = serde_json::from_str(&content)?;
    let records_before = records.len() as u64;

    let mut kept: Vec<Record> = Vec::with_capacity(records.len());
    for mut record in records {
        // Identity fields from the buggy run are suspect; recompute
        record.fingerprint = None;
        record.identity_basis = None;
        record.id = None;
        if dedup.admit(&mut record).is_new {
            kept.push(record);
        }
    }

    let duplicates_removed = records_before - kept.len() as u64;

    if !settings.apply {
        tracing::info!(
            "Repair dry run for {}: {} of {} records would survive ({} duplicates)",
            dataset.display(),
            kept.len(),
            records_before,
            duplicates_removed
        );
        return Ok(RepairReport {
            records_before,
            records_after: kept.len() as u64,
            duplicates_removed,
            backup_path: None,
            applied: false,
        });
    }

    // Guard: backup must exist before the dataset is touched
    let backup_path = backup_destination(dataset, settings);
    fs::copy(dataset, &backup_path).map_err(|e| SweepError::BackupFailed {
        path: dataset.display().to_string(),
        message: format!("cannot write backup {}: {}", backup_path.display(), e),
    })?;
    tracing::info!("Backed up {} to {}", dataset.display(), backup_path.display());

    write_atomic(dataset, serde_json::to_string_pretty(&kept)?.as_bytes())?;
    tracing::info!(
        "Repaired {}: {} -> {} records ({} duplicates removed)",
        dataset.display(),
        records_before,
        kept.len(),
        duplicates_removed
    );

    Ok(RepairReport {
        records_before,
        records_after: kept.len() as u64,
        duplicates_removed,
        backup_path: Some(backup_path),
        applied: true,
    })
}

fn backup_destination(dataset: &Path, settings: &RepairSettings) -> PathBuf {
    let stem = dataset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let name = format!("{}.bak-{}.json", stem, Utc::now().format("%Y%m%dT%H%M%S"));
    match &settings.backup_dir {
        Some(dir) => dir.join(name),
        None => dataset.parent().unwrap_or(Path::new(".")).join(name),
    }
}
