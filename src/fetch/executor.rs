use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::{FetchError, SchemaFetcher};
use crate::observability::Metrics;
use crate::store::SchemaFileCache;

/// Resolved result of a schema fetch
pub type FetchOutcome = Result<String, FetchError>;

struct FetchJob {
    uri: String,
    cancelled: Arc<AtomicBool>,
    tx: watch::Sender<Option<FetchOutcome>>,
}

/// Awaitable handle for one schema fetch
///
/// The handle resolves at most once; waiting again after resolution returns
/// the cached outcome immediately. Cancellation is best-effort: an unstarted
/// job is skipped, an in-flight download runs to completion but its result
/// is discarded.
pub struct FetchHandle {
    rx: watch::Receiver<Option<FetchOutcome>>,
    cancelled: Arc<AtomicBool>,
}

impl FetchHandle {
    /// Wait up to `timeout` for the fetch to resolve
    pub async fn wait(&self, timeout: Duration) -> FetchOutcome {
        let mut rx = self.rx.clone();

        let current = rx.borrow().as_ref().cloned();
        if let Some(outcome) = current {
            return outcome;
        }

        match tokio::time::timeout(timeout, rx.wait_for(|v| v.is_some())).await {
            Ok(Ok(value)) => match value.as_ref() {
                Some(outcome) => outcome.clone(),
                None => Err(FetchError::Shutdown),
            },
            Ok(Err(_)) => Err(FetchError::Shutdown),
            Err(_) => Err(FetchError::TimedOut),
        }
    }

    /// Best-effort cancellation: no further work is scheduled and a late
    /// result is discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

/// Fixed-size worker pool executing schema fetch jobs
///
/// One unbounded channel per worker with round-robin dispatch, so that
/// `submit` is synchronous and never blocks the caller. Workers consult the
/// schema cache before going to the network and populate it on success.
pub struct FetchExecutor {
    senders: Mutex<Vec<mpsc::UnboundedSender<FetchJob>>>,
    next_worker: AtomicUsize,
}

impl FetchExecutor {
    pub fn new(
        workers: usize,
        fetcher: Arc<dyn SchemaFetcher>,
        cache: Option<Arc<SchemaFileCache>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let workers = workers.max(1);
        info!(workers, "Starting fetch executor");

        let mut senders = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            tokio::spawn(worker_loop(
                worker_id,
                rx,
                Arc::clone(&fetcher),
                cache.clone(),
                Arc::clone(&metrics),
            ));
        }

        Self {
            senders: Mutex::new(senders),
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Submit a fetch job. Non-blocking; the returned handle resolves once a
    /// worker finishes (or immediately with `Shutdown` after shutdown).
    pub fn submit(&self, uri: impl Into<String>) -> FetchHandle {
        let uri = uri.into();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(None);

        let senders = self.senders.lock().unwrap();
        if senders.is_empty() {
            warn!(%uri, "Fetch submitted after executor shutdown");
            let _ = tx.send(Some(Err(FetchError::Shutdown)));
            return FetchHandle { rx, cancelled };
        }

        let worker_idx = self.next_worker.fetch_add(1, Ordering::Relaxed) % senders.len();
        let job = FetchJob {
            uri,
            cancelled: Arc::clone(&cancelled),
            tx,
        };

        if let Err(failed) = senders[worker_idx].send(job) {
            // Worker is gone; resolve the handle instead of leaving it pending
            let _ = failed.0.tx.send(Some(Err(FetchError::Shutdown)));
        } else {
            debug!(worker_idx, "Fetch job dispatched");
        }

        FetchHandle { rx, cancelled }
    }

    /// Stop accepting jobs. Already-queued jobs drain; workers then exit.
    pub fn shutdown(&self) {
        info!("Shutting down fetch executor");
        self.senders.lock().unwrap().clear();
    }
}

async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::UnboundedReceiver<FetchJob>,
    fetcher: Arc<dyn SchemaFetcher>,
    cache: Option<Arc<SchemaFileCache>>,
    metrics: Arc<Metrics>,
) {
    while let Some(job) = rx.recv().await {
        if job.cancelled.load(Ordering::SeqCst) {
            debug!(worker_id, uri = %job.uri, "Skipping cancelled fetch");
            let _ = job.tx.send(Some(Err(FetchError::Cancelled)));
            continue;
        }

        let cached = cache
            .as_ref()
            .and_then(|c| c.get(&job.uri).ok().flatten());

        let outcome = match cached {
            Some(text) => {
                debug!(worker_id, uri = %job.uri, "Schema served from cache");
                Ok(text)
            }
            None => match fetcher.fetch(&job.uri).await {
                Ok(text) => {
                    if let Some(cache) = &cache {
                        if let Err(e) = cache.store(&job.uri, text.as_bytes()) {
                            warn!(uri = %job.uri, error = %e, "Failed to cache schema");
                        }
                    }
                    metrics.fetch_succeeded();
                    Ok(text)
                }
                Err(e) => {
                    metrics.fetch_failed();
                    warn!(worker_id, uri = %job.uri, error = %e, "Schema fetch failed");
                    Err(e)
                }
            },
        };

        if job.cancelled.load(Ordering::SeqCst) {
            debug!(worker_id, uri = %job.uri, "Discarding result of cancelled fetch");
            let _ = job.tx.send(Some(Err(FetchError::Cancelled)));
            continue;
        }

        let _ = job.tx.send(Some(outcome));
    }

    debug!(worker_id, "Fetch worker exiting");
}
