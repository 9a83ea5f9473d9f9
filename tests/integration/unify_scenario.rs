//! End-to-end unify scenarios over real files
//!
//! Covers the canonical reconciliation case: several partial files with
//! a known number of verbatim cross-file duplicates, merged into one
//! master dataset with an exact report.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use sweepline::dedup::RecordDeduplicator;
use sweepline::unify::{repair, unify, RepairSettings, UnifySettings};
use sweepline::Record;
use tempfile::TempDir;

fn dedup() -> RecordDeduplicator {
    RecordDeduplicator::new("unify", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

fn settings(dir: &Path) -> UnifySettings {
    UnifySettings {
        min_input_bytes: UnifySettings::DEFAULT_MIN_INPUT_BYTES,
        archive_dir: dir.join("archived"),
        output_path: dir.join("master.json"),
        report_path: dir.join("report.json"),
    }
}

fn body(n: usize) -> String {
    format!(
        "Posting number {} with a body long enough to fingerprint on content",
        n
    )
}

fn write_file(path: &Path, bodies: &[String], source: &str) {
    let records: Vec<Record> = bodies
        .iter()
        .map(|b| {
            let mut r = Record::from_body(b.clone());
            r.source = Some(source.to_string());
            r
        })
        .collect();
    fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
}

#[test]
fn test_three_file_scenario_counts() {
    let dir = TempDir::new().unwrap();

    // 10 + 10 + 5 records; exactly 3 bodies duplicated verbatim across
    // files; everything else distinct
    let file_a: Vec<String> = (0..10).map(body).collect();
    let mut file_b: Vec<String> = (10..20).map(body).collect();
    file_b[0] = body(0); // duplicate of a
    file_b[7] = body(3); // duplicate of a
    let mut file_c: Vec<String> = (20..25).map(body).collect();
    file_c[4] = body(12); // duplicate of b

    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    let c = dir.path().join("c.json");
    write_file(&a, &file_a, "site-a");
    write_file(&b, &file_b, "site-b");
    write_file(&c, &file_c, "site-c");

    let settings = settings(dir.path());
    let outcome = unify(&[a, b, c], &settings, &mut dedup()).unwrap();

    assert_eq!(outcome.report.total_read, 25);
    assert_eq!(outcome.report.duplicates_removed, 3);
    assert_eq!(outcome.report.unique_records, 22);
    assert_eq!(outcome.report.duplicates_by_source.get("site-b"), Some(&2));
    assert_eq!(outcome.report.duplicates_by_source.get("site-c"), Some(&1));

    let master: Vec<Record> =
        serde_json::from_str(&fs::read_to_string(&outcome.output_path).unwrap()).unwrap();
    assert_eq!(master.len(), 22);

    // Canonical ids are unique across the consolidated set
    let mut ids: Vec<String> = master
        .iter()
        .map(|r| r.id.as_ref().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 22);

    // All three inputs were archived
    for name in ["a.json", "b.json", "c.json"] {
        assert!(settings.archive_dir.join(name).exists());
        assert!(!dir.path().join(name).exists());
    }
}

#[test]
fn test_unify_twice_produces_identical_datasets() {
    let bodies: Vec<String> = (0..8).map(body).collect();

    let mut datasets = Vec::new();
    for _ in 0..2 {
        let dir = TempDir::new().unwrap();
        let one = dir.path().join("one.json");
        let two = dir.path().join("two.json");
        write_file(&one, &bodies[..5], "site-a");
        write_file(&two, &bodies[3..], "site-b");

        let settings = settings(dir.path());
        // Input order reversed on purpose; sorted-by-name order governs
        let outcome = unify(&[two, one], &settings, &mut dedup()).unwrap();
        datasets.push(fs::read_to_string(&outcome.output_path).unwrap());
    }

    assert_eq!(datasets[0], datasets[1]);
}

#[test]
fn test_repair_after_unify_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let bodies: Vec<String> = (0..6).map(body).collect();
    write_file(&a, &bodies, "site-a");

    let settings = settings(dir.path());
    let outcome = unify(&[a], &settings, &mut dedup()).unwrap();

    let repair_settings = RepairSettings {
        apply: true,
        backup_dir: None,
    };
    let report = repair(&outcome.output_path, &repair_settings, &mut dedup()).unwrap();
    assert_eq!(report.duplicates_removed, 0);
    assert_eq!(report.records_before, 6);
    assert_eq!(report.records_after, 6);
    assert!(report.backup_path.unwrap().exists());
}

#[test]
fn test_corrupted_partial_does_not_abort_batch() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    let corrupt = dir.path().join("corrupt.json");
    write_file(&good, &[body(1)], "site-a");
    fs::write(&corrupt, r#"[{"body": "truncated mid-wri"#).unwrap();

    let settings = settings(dir.path());
    let outcome = unify(&[good, corrupt.clone()], &settings, &mut dedup()).unwrap();

    assert_eq!(outcome.report.files_processed, vec!["good.json"]);
    assert_eq!(outcome.report.files_skipped, vec!["corrupt.json"]);
    assert_eq!(outcome.report.unique_records, 1);
    // The corrupt file is left in place for inspection
    assert!(corrupt.exists());
}
