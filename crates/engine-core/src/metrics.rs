use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_processed: AtomicU64,
    requests_issued: AtomicU64,
    failures: AtomicU64,
    splits_finished: AtomicU64,
}

/// Run-wide counters shared by every split of a scan.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_processed: u64,
    pub requests_issued: u64,
    pub failures: u64,
    pub splits_finished: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_requests(&self, count: u64) {
        self.inner.requests_issued.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_splits_finished(&self, count: u64) {
        self.inner.splits_finished.fetch_add(count, Ordering::Relaxed);
    }

    pub fn rows_processed(&self) -> u64 {
        self.inner.rows_processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_processed: self.inner.rows_processed.load(Ordering::Relaxed),
            requests_issued: self.inner.requests_issued.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
            splits_finished: self.inner.splits_finished.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
