//! Crawl runner: the per-session orchestration loop
//!
//! For each planned query the runner discovers the page range, then
//! walks it page by page: probe, admit records through the
//! deduplicator, append the survivors to the session's collection, and
//! persist the checkpoint. The loop checks the cancellation token
//! between probes; an interrupted run saves a final checkpoint so the
//! next invocation can offer resumption.
//!
//! One runner owns one probe instance, one deduplication index, and one
//! checkpoint key; independent sites run as independent runners.

use crate::crawler::cancel::CancelToken;
use crate::dedup::RecordDeduplicator;
use crate::model::{Query, Record};
use crate::output::{print_run_summary, RecordStore, RunSummary};
use crate::pagination::{DiscoveryOutcome, DiscoverySettings, PaginationDiscoverer};
use crate::probe::{probe_with_retry, PageProbe};
use crate::session::{CheckpointStore, CrawlCheckpoint, ResumePolicy, SessionPhase};
use crate::Result;
use chrono::NaiveDate;

/// Orchestrates one crawl session over a planned query sequence
pub struct CrawlRunner<P: PageProbe> {
    session_name: String,
    site: String,
    queries: Vec<Query>,
    probe: P,
    discovery: DiscoverySettings,
    checkpoints: CheckpointStore,
    records: RecordStore,
    dedup: RecordDeduplicator,
    crawl_date: NaiveDate,
    cancel: CancelToken,
    phase: SessionPhase,
}

impl<P: PageProbe> CrawlRunner<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_name: impl Into<String>,
        site: impl Into<String>,
        queries: Vec<Query>,
        probe: P,
        discovery: DiscoverySettings,
        checkpoints: CheckpointStore,
        records: RecordStore,
        dedup: RecordDeduplicator,
        crawl_date: NaiveDate,
        cancel: CancelToken,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            site: site.into(),
            queries,
            probe,
            discovery,
            checkpoints,
            records,
            dedup,
            crawl_date,
            cancel,
            phase: SessionPhase::Fresh,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Runs the session to completion or interruption.
    ///
    /// # Returns
    ///
    /// The run summary; `summary.aborted` distinguishes an interrupted
    /// run (checkpoint kept) from a completed one (checkpoint cleared).
    pub async fn run(&mut self, policy: ResumePolicy) -> Result<RunSummary> {
        let mut checkpoint = self.load_or_fresh(policy)?;
        let mut summary = RunSummary {
            queries_planned: self.queries.len(),
            ..RunSummary::default()
        };

        if checkpoint.resume {
            self.rebuild_index()?;
        }

        self.phase = SessionPhase::Running;
        let start_index = checkpoint.query_index.min(self.queries.len());
        let resume_page = checkpoint.current_page.max(1);

        for index in start_index..self.queries.len() {
            let query = self.queries[index].clone();
            if checkpoint.completed_queries.contains(&query.id()) {
                checkpoint.query_index = index + 1;
                continue;
            }

            if self.cancel.is_cancelled() {
                return self.abort(checkpoint, summary);
            }

            let discoverer = PaginationDiscoverer::new(&self.probe, self.discovery.clone());
            let outcome = discoverer.discover(&query).await;
            match outcome {
                DiscoveryOutcome::NoResults => {
                    summary.queries_no_results += 1;
                    checkpoint.complete_query(&query.id());
                    self.save(&checkpoint)?;
                    summary.queries_completed += 1;
                    continue;
                }
                DiscoveryOutcome::Uncertain(_) => summary.queries_uncertain += 1,
                DiscoveryOutcome::LastPage(_) => {}
            }

            let last_page = outcome.page_count();
            let first_page = if index == start_index { resume_page } else { 1 };
            tracing::info!(
                "Crawling {} pages {}..={} for query {}",
                self.site,
                first_page,
                last_page,
                query
            );

            for page in first_page..=last_page {
                if self.cancel.is_cancelled() {
                    checkpoint.current_page = page;
                    return self.abort(checkpoint, summary);
                }

                let report =
                    probe_with_retry(&self.probe, &query, page, self.discovery.probe_attempts)
                        .await;
                summary.pages_crawled += 1;

                if !report.is_valid() {
                    // Inside a discovered range this is a flake or a
                    // shrunk result set; either way there is nothing to
                    // collect from this page
                    tracing::warn!("Page {} of {} yielded no records mid-range", page, query);
                } else {
                    let admitted = self.admit_page(&query, report.records, &mut summary)?;
                    checkpoint.records_collected += admitted;
                }

                checkpoint.current_page = page + 1;
                self.save(&checkpoint)?;
            }

            checkpoint.complete_query(&query.id());
            self.save(&checkpoint)?;
            summary.queries_completed += 1;
        }

        // Terminal state reached: the checkpoint has served its purpose
        self.checkpoints.clear(&self.session_name)?;
        self.phase = SessionPhase::Completed;

        print_run_summary(&self.session_name, &summary, self.dedup.stats());
        Ok(summary)
    }

    /// Admits one page of records and appends the survivors to the
    /// session's collection. Returns the number admitted.
    fn admit_page(
        &mut self,
        query: &Query,
        records: Vec<Record>,
        summary: &mut RunSummary,
    ) -> Result<u64> {
        let mut admitted = Vec::new();
        for mut record in records {
            summary.records_read += 1;
            if record.source.is_none() {
                record.source = Some(self.site.clone());
            }
            if record.category.is_none() {
                record.category = Some(query.id());
            }
            if self.dedup.admit(&mut record).is_new {
                admitted.push(record);
            }
        }

        if admitted.is_empty() {
            return Ok(0);
        }

        let path = self
            .records
            .collection_path(&self.site, query, self.crawl_date);
        self.records.append(&path, &admitted)?;
        Ok(admitted.len() as u64)
    }

    /// Loads the checkpoint and applies the resume policy
    fn load_or_fresh(&mut self, policy: ResumePolicy) -> Result<CrawlCheckpoint> {
        if let Some(envelope) = self.checkpoints.load(&self.session_name) {
            if policy.decide(&envelope) {
                let mut checkpoint = envelope.data;
                checkpoint.resume = true;
                // Collections and identities are keyed by the
                // interrupted run's date; a resume after midnight must
                // keep using it, not the resume day's date
                self.crawl_date = checkpoint.crawl_date;
                self.dedup.set_crawl_date(checkpoint.crawl_date);
                return Ok(checkpoint);
            }
            // Declining resume discards the old progress
            self.checkpoints.clear(&self.session_name)?;
        }
        Ok(CrawlCheckpoint::fresh(self.crawl_date))
    }

    /// Rebuilds the deduplication index from this session's flushed
    /// collections so resumed work does not re-admit what it already
    /// wrote
    fn rebuild_index(&mut self) -> Result<()> {
        let mut seeded = 0usize;
        for query in &self.queries {
            let path = self
                .records
                .collection_path(&self.site, query, self.crawl_date);
            let flushed = self.records.load(&path)?;
            seeded += flushed.len();
            self.dedup.seed(&flushed);
        }
        if seeded > 0 {
            tracing::info!(
                "Rebuilt dedup index from {} previously flushed records",
                seeded
            );
        }
        Ok(())
    }

    /// Ordered shutdown: probing already stopped, admitted records are
    /// flushed per page, so the remaining duties are the final
    /// checkpoint save and the summary. The probe resource is released
    /// when the runner drops.
    fn abort(
        &mut self,
        checkpoint: CrawlCheckpoint,
        mut summary: RunSummary,
    ) -> Result<RunSummary> {
        if let Err(e) = self.save(&checkpoint) {
            // Losing the position checkpoint is the worst failure this
            // path can produce; make it loud
            tracing::error!("Final checkpoint save failed during abort: {}", e);
        }
        self.phase = SessionPhase::Aborted;
        summary.aborted = true;
        tracing::info!(
            "Session {} aborted at {}",
            self.session_name,
            checkpoint.summary()
        );
        print_run_summary(&self.session_name, &summary, self.dedup.stats());
        Ok(summary)
    }

    fn save(&mut self, checkpoint: &CrawlCheckpoint) -> Result<()> {
        self.checkpoints.save(&self.session_name, checkpoint)?;
        self.phase = SessionPhase::Checkpointed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, ProbeReport};
    use tempfile::TempDir;

    /// Probe with a fixed number of pages per query, each yielding
    /// bodies unique per (query, page, slot)
    struct FixtureProbe {
        pages_per_query: u32,
        records_per_page: usize,
    }

    impl PageProbe for FixtureProbe {
        async fn probe(
            &self,
            query: &Query,
            page: u32,
        ) -> std::result::Result<ProbeReport, ProbeError> {
            if page > self.pages_per_query {
                return Ok(ProbeReport::invalid());
            }
            let records = (0..self.records_per_page)
                .map(|slot| {
                    Record::from_body(format!(
                        "Posting for {} on page {} in slot {} with enough body text",
                        query, page, slot
                    ))
                })
                .collect();
            Ok(ProbeReport { records })
        }
    }

    fn runner(
        dir: &TempDir,
        probe: FixtureProbe,
        queries: Vec<Query>,
        cancel: CancelToken,
    ) -> CrawlRunner<FixtureProbe> {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        runner_with(dir, probe, queries, cancel, date)
    }

    fn runner_with(
        dir: &TempDir,
        probe: FixtureProbe,
        queries: Vec<Query>,
        cancel: CancelToken,
        date: NaiveDate,
    ) -> CrawlRunner<FixtureProbe> {
        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        let records = RecordStore::open(dir.path().join("out")).unwrap();
        CrawlRunner::new(
            "fixture",
            "fixture",
            queries,
            probe,
            DiscoverySettings {
                step: 2,
                ceiling: 20,
                probe_attempts: 1,
            },
            checkpoints,
            records,
            RecordDeduplicator::new("fixture", date),
            date,
            cancel,
        )
    }

    #[tokio::test]
    async fn test_full_run_completes_and_clears_checkpoint() {
        let dir = TempDir::new().unwrap();
        let queries = vec![Query::new("dev", "backend"), Query::new("dev", "frontend")];
        let probe = FixtureProbe {
            pages_per_query: 3,
            records_per_page: 2,
        };
        let mut runner = runner(&dir, probe, queries, CancelToken::new());

        let summary = runner.run(ResumePolicy::Never).await.unwrap();
        assert_eq!(summary.queries_completed, 2);
        assert_eq!(summary.records_read, 12);
        assert!(!summary.aborted);
        assert_eq!(runner.phase(), SessionPhase::Completed);

        // Terminal state: checkpoint gone
        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        assert!(checkpoints.load("fixture").is_none());

        // Both collections exist with admitted records
        let records = RecordStore::open(dir.path().join("out")).unwrap();
        let collections = records.list_collections().unwrap();
        assert_eq!(collections.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_saves_checkpoint() {
        let dir = TempDir::new().unwrap();
        let queries = vec![Query::new("dev", "backend")];
        let probe = FixtureProbe {
            pages_per_query: 3,
            records_per_page: 1,
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut runner = runner(&dir, probe, queries, cancel);

        let summary = runner.run(ResumePolicy::Never).await.unwrap();
        assert!(summary.aborted);
        assert_eq!(runner.phase(), SessionPhase::Aborted);

        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        assert!(checkpoints.load("fixture").is_some());
    }

    #[tokio::test]
    async fn test_resumed_run_skips_completed_queries() {
        let dir = TempDir::new().unwrap();

        // A checkpoint left by an interrupted run: first query done
        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        let mut left_behind =
            CrawlCheckpoint::fresh(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        left_behind.complete_query("dev/backend");
        checkpoints.save("fixture", &left_behind).unwrap();
        drop(checkpoints);

        let queries = vec![Query::new("dev", "backend"), Query::new("dev", "frontend")];
        let probe = FixtureProbe {
            pages_per_query: 2,
            records_per_page: 1,
        };
        let mut runner = runner(&dir, probe, queries, CancelToken::new());

        let summary = runner.run(ResumePolicy::Always).await.unwrap();
        // Only the second query was crawled this run
        assert_eq!(summary.queries_completed, 1);
        assert!(!summary.aborted);

        let records = RecordStore::open(dir.path().join("out")).unwrap();
        let collections = records.list_collections().unwrap();
        assert_eq!(collections.len(), 1);
        assert!(collections[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("dev-frontend"));
    }

    #[tokio::test]
    async fn test_resume_rebuilds_dedup_index_from_flushed_output() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let query = Query::new("dev", "backend");

        // First run: crawl everything, then put its checkpoint back as
        // if the process died right before completing the query
        {
            let probe = FixtureProbe {
                pages_per_query: 2,
                records_per_page: 2,
            };
            let mut r = runner(
                &dir,
                probe,
                vec![query.clone()],
                CancelToken::new(),
            );
            r.run(ResumePolicy::Never).await.unwrap();
        }
        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        let stale = CrawlCheckpoint::fresh(date);
        checkpoints.save("fixture", &stale).unwrap();
        drop(checkpoints);

        // Second run re-crawls the same pages; the rebuilt index drops
        // every record as a duplicate
        let probe = FixtureProbe {
            pages_per_query: 2,
            records_per_page: 2,
        };
        let mut r = runner(&dir, probe, vec![query.clone()], CancelToken::new());
        r.run(ResumePolicy::Always).await.unwrap();

        let records = RecordStore::open(dir.path().join("out")).unwrap();
        let path = records.collection_path("fixture", &query, date);
        let collection = records.load(&path).unwrap();
        assert_eq!(collection.len(), 4, "re-crawl must not duplicate records");
    }

    #[tokio::test]
    async fn test_resume_after_midnight_keeps_original_crawl_date() {
        let dir = TempDir::new().unwrap();
        let day_one = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let query = Query::new("dev", "backend");

        // Day one: crawl everything, then put a day-one checkpoint back
        // as if the process died right before completing the query
        {
            let probe = FixtureProbe {
                pages_per_query: 2,
                records_per_page: 2,
            };
            let mut r = runner_with(&dir, probe, vec![query.clone()], CancelToken::new(), day_one);
            r.run(ResumePolicy::Never).await.unwrap();
        }
        let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
        checkpoints
            .save("fixture", &CrawlCheckpoint::fresh(day_one))
            .unwrap();
        drop(checkpoints);

        // The resume happens after midnight: the runner is constructed
        // with day two, but must restore day one from the checkpoint so
        // the rebuilt index sees day one's flushed collection
        let probe = FixtureProbe {
            pages_per_query: 2,
            records_per_page: 2,
        };
        let mut r = runner_with(&dir, probe, vec![query.clone()], CancelToken::new(), day_two);
        r.run(ResumePolicy::Always).await.unwrap();

        let records = RecordStore::open(dir.path().join("out")).unwrap();
        let day_one_collection = records
            .load(&records.collection_path("fixture", &query, day_one))
            .unwrap();
        assert_eq!(
            day_one_collection.len(),
            4,
            "resume must not re-admit records flushed before midnight"
        );
        let day_two_collection = records
            .load(&records.collection_path("fixture", &query, day_two))
            .unwrap();
        assert!(day_two_collection.is_empty());
    }
}
