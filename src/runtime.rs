//! Worker pool fanning URLs through fetch and extraction.

use crate::fetcher::Fetcher;
use futures_util::future::join_all;
use futures_util::FutureExt;
use meta_parser::{ExtractedRecord, Extractor};
use std::collections::VecDeque;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Records gathered by one run, in completion order, plus its counters.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Extracted records in the order their URLs completed.
    pub records: Vec<ExtractedRecord>,
    /// Counters collected during the run.
    pub stats: RunStats,
}

/// Snapshot of per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// URLs handed to workers.
    pub urls_dispatched: usize,
    /// URLs whose document was retrieved.
    pub documents_fetched: usize,
    /// URLs that exhausted their attempts.
    pub fetch_failures: usize,
    /// Records produced.
    pub records_extracted: usize,
    /// Documents that yielded no record.
    pub empty_extractions: usize,
    /// URLs abandoned because their unit of work panicked.
    pub worker_panics: usize,
    /// Workers started for the run.
    pub workers_spawned: usize,
}

/// Bounded pool running fetch then extract for every URL, isolating failures per URL.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
    concurrency: usize,
}

impl Orchestrator {
    /// Pool of at most `concurrency` workers; zero is raised to one.
    pub fn new(fetcher: Fetcher, extractor: Extractor, concurrency: usize) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            concurrency: concurrency.max(1),
        }
    }

    /// Runs on a dedicated multi-threaded runtime sized to the worker count.
    pub fn run_blocking(&self, urls: Vec<String>) -> io::Result<RunReport> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.concurrency)
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run(urls)))
    }

    /// Processes every URL (duplicates included) and returns what was extracted.
    ///
    /// Never fails: fetch errors, empty extractions and panics cost only the URL they hit.
    pub async fn run(&self, urls: Vec<String>) -> RunReport {
        let metrics = Arc::new(Metrics::default());
        if urls.is_empty() {
            debug!("no URLs to process");
            return RunReport {
                records: Vec::new(),
                stats: metrics.snapshot(),
            };
        }

        let start = Instant::now();
        let worker_count = self.concurrency.min(urls.len());
        info!(urls = urls.len(), workers = worker_count, "starting scrape");

        let queue = Arc::new(Mutex::new(VecDeque::from(urls)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let workers: Vec<_> = (0..worker_count)
            .map(|id| {
                metrics.record_worker_spawned();
                let unit = WorkUnit {
                    fetcher: self.fetcher.clone(),
                    extractor: Arc::clone(&self.extractor),
                    metrics: Arc::clone(&metrics),
                };
                tokio::spawn(worker_loop(id, Arc::clone(&queue), unit, tx.clone()))
            })
            .collect();
        drop(tx);

        for joined in join_all(workers).await {
            if let Err(err) = joined {
                error!(error = %err, "worker task aborted");
            }
        }

        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }

        metrics.report(start.elapsed());
        RunReport {
            records,
            stats: metrics.snapshot(),
        }
    }
}

struct WorkUnit {
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
    metrics: Arc<Metrics>,
}

impl WorkUnit {
    async fn process(&self, url: &str) -> Vec<ExtractedRecord> {
        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(err) => {
                self.metrics.record_fetch_failure();
                warn!(url, error = %err, "skipping url");
                return Vec::new();
            }
        };
        self.metrics.record_document_fetched();

        let records = self.extractor.extract(url, &body);
        if records.is_empty() {
            self.metrics.record_empty_extraction();
            warn!(url, "no records parsed");
        } else {
            self.metrics.record_extracted(records.len());
            info!(url, count = records.len(), "parsed records");
        }
        records
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<String>>>,
    unit: WorkUnit,
    results: mpsc::UnboundedSender<ExtractedRecord>,
) {
    loop {
        let Some(url) = queue.lock().await.pop_front() else {
            break;
        };
        unit.metrics.record_dispatched();

        match AssertUnwindSafe(unit.process(&url)).catch_unwind().await {
            Ok(records) => {
                for record in records {
                    if results.send(record).is_err() {
                        error!(worker_id, "result collector closed");
                        return;
                    }
                }
            }
            Err(_) => {
                unit.metrics.record_panic();
                error!(worker_id, url = %url, "unit of work panicked, url skipped");
            }
        }
    }
    debug!(worker_id, "worker drained queue");
}

#[derive(Default)]
struct Metrics {
    urls_dispatched: AtomicUsize,
    documents_fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    records_extracted: AtomicUsize,
    empty_extractions: AtomicUsize,
    worker_panics: AtomicUsize,
    workers_spawned: AtomicUsize,
}

impl Metrics {
    fn record_dispatched(&self) {
        self.urls_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_document_fetched(&self) {
        self.documents_fetched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_extracted(&self, count: usize) {
        self.records_extracted.fetch_add(count, Ordering::Relaxed);
    }

    fn record_empty_extraction(&self) {
        self.empty_extractions.fetch_add(1, Ordering::Relaxed);
    }

    fn record_panic(&self) {
        self.worker_panics.fetch_add(1, Ordering::Relaxed);
    }

    fn record_worker_spawned(&self) {
        self.workers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RunStats {
        RunStats {
            urls_dispatched: self.urls_dispatched.load(Ordering::Relaxed),
            documents_fetched: self.documents_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            records_extracted: self.records_extracted.load(Ordering::Relaxed),
            empty_extractions: self.empty_extractions.load(Ordering::Relaxed),
            worker_panics: self.worker_panics.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
        }
    }

    fn report(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32().max(f32::EPSILON);
        let stats = self.snapshot();
        info!(
            elapsed_secs = secs,
            urls_per_sec = stats.urls_dispatched as f32 / secs,
            dispatched = stats.urls_dispatched,
            fetched = stats.documents_fetched,
            fetch_failures = stats.fetch_failures,
            records = stats.records_extracted,
            empty = stats.empty_extractions,
            panics = stats.worker_panics,
            workers = stats.workers_spawned,
            "scrape finished"
        );
    }
}
