//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with an env-filter (`RUST_LOG`) for embedding hosts
/// that have not set up a subscriber of their own
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    printers_created: AtomicU64,
    fetches_succeeded: AtomicU64,
    fetches_failed: AtomicU64,
    bodies_stored: AtomicU64,
    renders_completed: AtomicU64,
    renders_degraded: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printer_created(&self) {
        self.printers_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "printers_created", "Metric incremented");
    }

    pub fn fetch_succeeded(&self) {
        self.fetches_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetches_succeeded", "Metric incremented");
    }

    pub fn fetch_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetches_failed", "Metric incremented");
    }

    pub fn body_stored(&self) {
        self.bodies_stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "bodies_stored", "Metric incremented");
    }

    pub fn render_completed(&self) {
        self.renders_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "renders_completed", "Metric incremented");
    }

    pub fn render_degraded(&self) {
        self.renders_degraded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "renders_degraded", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            printers_created: self.printers_created.load(Ordering::Relaxed),
            fetches_succeeded: self.fetches_succeeded.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
            bodies_stored: self.bodies_stored.load(Ordering::Relaxed),
            renders_completed: self.renders_completed.load(Ordering::Relaxed),
            renders_degraded: self.renders_degraded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub printers_created: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub bodies_stored: u64,
    pub renders_completed: u64,
    pub renders_degraded: u64,
}
