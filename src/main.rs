//! Sweepline main entry point
//!
//! Command-line interface for the job-listing crawl consolidator:
//! running crawl sessions, unifying partial outputs, repairing an
//! existing dataset, and inspecting the last reconciliation report.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sweepline::config::load_config_with_hash;
use sweepline::crawler::{cancel_on_ctrl_c, crawl, CancelToken};
use sweepline::dedup::RecordDeduplicator;
use sweepline::output::RecordStore;
use sweepline::session::ResumePolicy;
use sweepline::unify::{repair, unify, RepairSettings, UnifySettings};
use sweepline::ReconciliationReport;
use tracing_subscriber::EnvFilter;

/// Sweepline: crawl job-listing sites and consolidate the postings
#[derive(Parser, Debug)]
#[command(name = "sweepline")]
#[command(version = "1.0.0")]
#[command(about = "Job-listing crawl core and consolidator", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one crawl session (resumes an interrupted run by default)
    Crawl {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Ignore any existing checkpoint and start fresh
        #[arg(long, conflicts_with_all = ["always_resume", "never_resume"])]
        fresh: bool,

        /// Resume without prompting (for unattended runs)
        #[arg(long, conflicts_with = "never_resume")]
        always_resume: bool,

        /// Discard any checkpoint without prompting
        #[arg(long)]
        never_resume: bool,

        /// Override the pagination page ceiling
        #[arg(long, value_name = "N")]
        max_pages: Option<u32>,
    },

    /// Consolidate partial record collections into the master dataset
    Unify {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Re-deduplicate an existing dataset (dry run unless --apply)
    Repair {
        /// Path to the consolidated dataset
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,

        /// Actually rewrite the dataset (a timestamped backup is taken
        /// first)
        #[arg(long)]
        apply: bool,

        /// Source label for identifiers assigned during the repair
        #[arg(long, default_value = "repair")]
        source: String,
    },

    /// Show the last reconciliation report and dataset size
    Stats {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            config,
            fresh,
            always_resume,
            never_resume,
            max_pages,
        } => {
            let policy = if fresh || never_resume {
                ResumePolicy::Never
            } else if always_resume {
                ResumePolicy::Always
            } else {
                ResumePolicy::Interactive
            };
            handle_crawl(&config, policy, max_pages).await
        }
        Command::Unify { config } => handle_unify(&config),
        Command::Repair {
            dataset,
            apply,
            source,
        } => handle_repair(&dataset, apply, &source),
        Command::Stats { config } => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sweepline=info,warn"),
            1 => EnvFilter::new("sweepline=debug,info"),
            2 => EnvFilter::new("sweepline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl subcommand
async fn handle_crawl(
    config_path: &PathBuf,
    policy: ResumePolicy,
    max_pages: Option<u32>,
) -> Result<()> {
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (mut config, config_hash) = load_config_with_hash(config_path)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if let Some(ceiling) = max_pages {
        tracing::info!("Page ceiling overridden to {}", ceiling);
        config.pagination.max_pages = ceiling;
        config.pagination.step_size = config.pagination.step_size.min(ceiling);
    }

    let cancel = CancelToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let summary = crawl(config, policy, cancel).await?;
    if summary.aborted {
        tracing::info!("Crawl interrupted; run again to resume");
    } else {
        tracing::info!("Crawl completed successfully");
    }
    Ok(())
}

/// Handles the unify subcommand
fn handle_unify(config_path: &PathBuf) -> Result<()> {
    let (config, _) = load_config_with_hash(config_path)?;

    let store = RecordStore::open(&config.output.records_dir)?;
    let master_path = PathBuf::from(&config.output.master_path);
    let report_path = PathBuf::from(&config.output.report_path);

    // The master dataset and report may live inside the records
    // directory; they are never unify inputs
    let inputs: Vec<PathBuf> = store
        .list_collections()?
        .into_iter()
        .filter(|p| *p != master_path && *p != report_path)
        .collect();

    if inputs.is_empty() {
        println!("No partial collections found in {}", config.output.records_dir);
        return Ok(());
    }

    let settings = UnifySettings {
        min_input_bytes: UnifySettings::DEFAULT_MIN_INPUT_BYTES,
        archive_dir: PathBuf::from(&config.output.archive_dir),
        output_path: master_path,
        report_path,
    };
    let mut dedup = RecordDeduplicator::new(
        config.site.name.clone(),
        chrono::Utc::now().date_naive(),
    )
    .with_min_body_length(config.dedup.min_body_length);

    let outcome = unify(&inputs, &settings, &mut dedup)?;
    print_report(&outcome.report);
    println!("\nMaster dataset: {}", outcome.output_path.display());
    Ok(())
}

/// Handles the repair subcommand
fn handle_repair(
    dataset: &PathBuf,
    apply: bool,
    source: &str,
) -> Result<()> {
    let settings = RepairSettings {
        apply,
        backup_dir: None,
    };
    let mut dedup = RecordDeduplicator::new(source, chrono::Utc::now().date_naive());
    let report = repair(dataset, &settings, &mut dedup)?;

    println!("=== Repair {} ===\n", if apply { "Result" } else { "Dry Run" });
    println!("Records before: {}", report.records_before);
    println!("Records after: {}", report.records_after);
    println!("Duplicates removed: {}", report.duplicates_removed);
    if let Some(backup) = &report.backup_path {
        println!("Backup: {}", backup.display());
    }
    if !report.applied {
        println!("\nNo changes written (use --apply to rewrite the dataset)");
    }
    Ok(())
}

/// Handles the stats subcommand
fn handle_stats(config_path: &PathBuf) -> Result<()> {
    let (config, _) = load_config_with_hash(config_path)?;

    match std::fs::read_to_string(&config.output.report_path) {
        Ok(content) => {
            let report: ReconciliationReport = serde_json::from_str(&content)?;
            print_report(&report);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No reconciliation report at {}", config.output.report_path);
        }
        Err(e) => return Err(e.into()),
    }

    match std::fs::read_to_string(&config.output.master_path) {
        Ok(content) => {
            let records: Vec<sweepline::Record> = serde_json::from_str(&content)?;
            println!("\nMaster dataset: {} records", records.len());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("\nNo master dataset at {}", config.output.master_path);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Prints a reconciliation report in the same shape the crawl summary
/// uses
fn print_report(report: &ReconciliationReport) {
    println!("=== Reconciliation Report ===\n");
    println!("Timestamp: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Total read: {}", report.total_read);
    println!("Unique records: {}", report.unique_records);
    println!("Duplicates removed: {}", report.duplicates_removed);

    if !report.duplicates_by_source.is_empty() {
        println!("\nDuplicates by source:");
        for (source, count) in &report.duplicates_by_source {
            println!("  {}: {}", source, count);
        }
    }

    println!("\nFiles processed ({}):", report.files_processed.len());
    for file in &report.files_processed {
        println!("  - {}", file);
    }
    if !report.files_skipped.is_empty() {
        println!("\nFiles skipped ({}):", report.files_skipped.len());
        for file in &report.files_skipped {
            println!("  - {}", file);
        }
    }
}
