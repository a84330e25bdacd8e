//! Record pipeline: bounded-concurrency detail fetching
//!
//! Workers fetch and extract detail pages and send the results over a
//! channel to a single writer that owns the sink. Only the writer touches
//! the sink, so the duplicate check and the append happen as one step.

use crate::crawler::fetcher::Fetch;
use crate::crawler::politeness::Politeness;
use crate::extract::{extract_record, FetchFailurePolicy, ListingRecord, SiteProfile};
use crate::sink::{AppendOutcome, Sink, SinkError};
use crate::ScrapeError;
use std::ops::AddAssign;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Counters of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// URLs handed to the pipeline
    pub queued: usize,
    /// URLs already in the sink; never fetched
    pub skipped: usize,
    /// Detail pages fetched successfully
    pub fetched: usize,
    pub fetch_failures: usize,
    /// Rows persisted
    pub written: usize,
    /// Records whose key the sink already held when they arrived
    pub duplicates: usize,
    /// Fetched records discarded for carrying nothing but the key
    pub dropped: usize,
}

impl AddAssign for PipelineReport {
    fn add_assign(&mut self, other: Self) {
        self.queued += other.queued;
        self.skipped += other.skipped;
        self.fetched += other.fetched;
        self.fetch_failures += other.fetch_failures;
        self.written += other.written;
        self.duplicates += other.duplicates;
        self.dropped += other.dropped;
    }
}

/// What a worker hands to the writer
#[derive(Debug)]
enum WorkerOutcome {
    Extracted(ListingRecord),
    FetchFailed(Option<ListingRecord>),
    Empty(String),
}

pub struct RecordPipeline {
    profile: Arc<SiteProfile>,
    fetcher: Arc<dyn Fetch>,
    politeness: Politeness,
    max_workers: usize,
}

impl RecordPipeline {
    pub fn new(
        profile: Arc<SiteProfile>,
        fetcher: Arc<dyn Fetch>,
        politeness: Politeness,
        max_workers: usize,
    ) -> Self {
        Self {
            profile,
            fetcher,
            politeness,
            max_workers: max_workers.max(1),
        }
    }

    /// Processes `urls` into `sink` and hands the sink back
    ///
    /// URLs the sink already holds are skipped before any fetch. A failed
    /// detail fetch never aborts the others; only a sink write error is fatal.
    pub async fn run(
        &self,
        urls: Vec<String>,
        sink: Box<dyn Sink>,
    ) -> Result<(Box<dyn Sink>, PipelineReport), ScrapeError> {
        let mut report = PipelineReport {
            queued: urls.len(),
            ..Default::default()
        };

        let pending: Vec<String> = urls
            .into_iter()
            .filter(|url| {
                let done = sink.contains(url);
                if done {
                    tracing::debug!("Already stored, skipping {}", url);
                    report.skipped += 1;
                }
                !done
            })
            .collect();

        if pending.is_empty() {
            tracing::info!("Nothing to fetch ({} already stored)", report.skipped);
            return Ok((sink, report));
        }

        tracing::info!(
            "Fetching {} detail pages with {} workers ({} already stored)",
            pending.len(),
            self.max_workers,
            report.skipped
        );

        let (tx, rx) = mpsc::channel(self.max_workers * 2);
        let writer = tokio::task::spawn_blocking(move || write_outcomes(sink, rx));

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut workers = JoinSet::new();

        for url in pending {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            // The writer only goes away after a sink error; stop feeding it
            if tx.is_closed() {
                break;
            }

            let tx = tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let profile = Arc::clone(&self.profile);
            let politeness = self.politeness;

            workers.spawn(async move {
                let _permit = permit;
                let outcome = process_url(fetcher.as_ref(), &profile, politeness, url).await;
                // A send only fails once the writer has stopped on an error
                let _ = tx.send(outcome).await;
            });
        }

        drop(tx);

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Detail worker failed: {}", e);
            }
        }

        let (sink, tally) = writer.await??;
        report.fetched = tally.fetched;
        report.fetch_failures = tally.fetch_failures;
        report.written = tally.written;
        report.duplicates = tally.duplicates;
        report.dropped = tally.dropped;

        Ok((sink, report))
    }
}

async fn process_url(
    fetcher: &dyn Fetch,
    profile: &SiteProfile,
    politeness: Politeness,
    url: String,
) -> WorkerOutcome {
    politeness.wait().await;

    match fetcher.fetch(&url).await {
        Ok(body) => {
            let record = extract_record(profile, &url, &body);
            if !record.has_content() && !profile.keep_empty_records {
                tracing::debug!("Nothing extracted from {}, dropping", url);
                WorkerOutcome::Empty(url)
            } else {
                WorkerOutcome::Extracted(record)
            }
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            match profile.on_fetch_error {
                FetchFailurePolicy::UrlOnly => {
                    WorkerOutcome::FetchFailed(Some(ListingRecord::new(profile.schema, url)))
                }
                FetchFailurePolicy::Skip => WorkerOutcome::FetchFailed(None),
            }
        }
    }
}

#[derive(Debug, Default)]
struct WriterTally {
    fetched: usize,
    fetch_failures: usize,
    written: usize,
    duplicates: usize,
    dropped: usize,
}

/// Writer loop; runs on a blocking thread since sink writes sync to disk
fn write_outcomes(
    mut sink: Box<dyn Sink>,
    mut rx: mpsc::Receiver<WorkerOutcome>,
) -> Result<(Box<dyn Sink>, WriterTally), SinkError> {
    let mut tally = WriterTally::default();

    while let Some(outcome) = rx.blocking_recv() {
        let record = match outcome {
            WorkerOutcome::Extracted(record) => {
                tally.fetched += 1;
                record
            }
            WorkerOutcome::FetchFailed(Some(record)) => {
                tally.fetch_failures += 1;
                record
            }
            WorkerOutcome::FetchFailed(None) => {
                tally.fetch_failures += 1;
                continue;
            }
            WorkerOutcome::Empty(url) => {
                tracing::trace!("Dropped {}", url);
                tally.fetched += 1;
                tally.dropped += 1;
                continue;
            }
        };

        match sink.append(&record)? {
            AppendOutcome::Written => {
                tally.written += 1;
                tracing::debug!("Stored {}", record.key());
                if tally.written % 25 == 0 {
                    tracing::info!("Progress: {} records stored", tally.written);
                }
            }
            AppendOutcome::Duplicate => {
                tally.duplicates += 1;
                tracing::debug!("Duplicate {}, not stored", record.key());
            }
        }
    }

    Ok((sink, tally))
}
