use crate::{
    error::{ScanStage, SplitFailure},
    scan::stats::SizeStats,
};
use engine_config::report::scan::{SplitOutcome, SplitReport};
use engine_core::{
    connectors::{
        kv::{GeoClient, KvClient},
        scanner::PartitionScanner,
    },
    error::ClientError,
    metrics::Metrics,
    stats::top_k::BoundedTopK,
};
use model::{execution::operation::ScanOperation, records::record::KvRecord};
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Lifecycle of a split. `Failed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SplitState {
    Running = 0,
    Completed = 1,
    Failed = 2,
}

impl SplitState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SplitState::Running,
            1 => SplitState::Completed,
            _ => SplitState::Failed,
        }
    }
}

/// Result of one fetch from the split's scanner.
#[derive(Debug)]
pub(crate) enum Fetched {
    Record(KvRecord),
    Exhausted,
    /// The split stopped while this unit waited for the scanner.
    Stopped,
}

/// Per-split settings, identical for every split of a run.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub operation: ScanOperation,
    pub max_in_flight: usize,
    pub timeout: Duration,
    pub collect_size_stats: bool,
    pub top_count: usize,
}

/// Handles shared by every split of a run.
#[derive(Clone)]
pub struct RunHandles {
    pub client: Arc<dyn KvClient>,
    pub geo: Option<Arc<dyn GeoClient>>,
    /// Raised by the first failing split; stops every sibling.
    pub stop: CancellationToken,
    pub metrics: Metrics,
    /// Notified whenever some split becomes quiescent.
    pub idle: Arc<Notify>,
}

impl RunHandles {
    pub fn new(client: Arc<dyn KvClient>, geo: Option<Arc<dyn GeoClient>>) -> Self {
        Self {
            client,
            geo,
            stop: CancellationToken::new(),
            metrics: Metrics::new(),
            idle: Arc::new(Notify::new()),
        }
    }
}

pub struct ScanTask {
    split_id: usize,
    options: SplitOptions,
    scanner: Mutex<Box<dyn PartitionScanner>>,
    handles: RunHandles,

    rows: AtomicU64,
    in_flight: AtomicUsize,
    state: AtomicU8,
    failure: OnceLock<SplitFailure>,

    size_stats: Option<SizeStats>,
    top_k: Option<BoundedTopK>,
}

impl ScanTask {
    pub fn new(
        split_id: usize,
        scanner: Box<dyn PartitionScanner>,
        options: SplitOptions,
        handles: RunHandles,
    ) -> Self {
        let collect = options.collect_size_stats && options.operation == ScanOperation::Count;
        let size_stats = collect.then(SizeStats::new);
        let top_k = (collect && options.top_count > 0).then(|| BoundedTopK::new(options.top_count));

        Self {
            split_id,
            options: SplitOptions {
                max_in_flight: options.max_in_flight.max(1),
                ..options
            },
            scanner: Mutex::new(scanner),
            handles,
            rows: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            state: AtomicU8::new(SplitState::Running as u8),
            failure: OnceLock::new(),
            size_stats,
            top_k,
        }
    }

    pub fn split_id(&self) -> usize {
        self.split_id
    }

    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SplitState {
        SplitState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn failure(&self) -> Option<&SplitFailure> {
        self.failure.get()
    }

    pub fn is_quiescent(&self) -> bool {
        self.in_flight() == 0
    }

    pub fn metrics(&self) -> &Metrics {
        &self.handles.metrics
    }

    /// New fetches may start only while running and not stopped.
    pub(crate) fn can_issue(&self) -> bool {
        self.state() == SplitState::Running && !self.handles.stop.is_cancelled()
    }

    pub(crate) fn try_acquire_slot(&self) -> bool {
        let max = self.options.max_in_flight;
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }

    /// Must be the last thing a unit does.
    pub(crate) fn release_slot(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.handles.idle.notify_one();
        }
    }

    pub(crate) async fn fetch_next(&self) -> Result<Fetched, ClientError> {
        let mut scanner = self.scanner.lock().await;
        if !self.can_issue() {
            return Ok(Fetched::Stopped);
        }
        match tokio::time::timeout(self.options.timeout, scanner.next()).await {
            Ok(Ok(Some(record))) => Ok(Fetched::Record(record)),
            Ok(Ok(None)) => Ok(Fetched::Exhausted),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ClientError::Timeout(self.options.timeout)),
        }
    }

    /// Applies the split's operation to one record.
    pub(crate) async fn apply(&self, record: &KvRecord) -> Result<(), (ScanStage, ClientError)> {
        let timeout = self.options.timeout;
        let handles = &self.handles;
        match self.options.operation {
            ScanOperation::Count => {
                if let Some(stats) = &self.size_stats {
                    stats.record(record);
                }
                if let Some(top_k) = &self.top_k {
                    top_k.push(&record.hash_key, &record.sort_key, record.row_size());
                }
            }
            ScanOperation::Copy => {
                handles.metrics.increment_requests(1);
                let set = handles
                    .client
                    .set(&record.hash_key, &record.sort_key, &record.value, timeout);
                with_deadline(timeout, set)
                    .await
                    .map_err(|e| (ScanStage::Set, e))?;
            }
            ScanOperation::Clear => {
                handles.metrics.increment_requests(1);
                let del = handles
                    .client
                    .del(&record.hash_key, &record.sort_key, timeout);
                with_deadline(timeout, del)
                    .await
                    .map_err(|e| (ScanStage::Del, e))?;
            }
            ScanOperation::DeriveGeoIndex => {
                let Some(geo) = &handles.geo else {
                    return Err((
                        ScanStage::GeoSet,
                        ClientError::Other("geo client not configured".to_string()),
                    ));
                };
                handles.metrics.increment_requests(1);
                let set = geo.set(&record.hash_key, &record.sort_key, &record.value, timeout);
                with_deadline(timeout, set)
                    .await
                    .map_err(|e| (ScanStage::GeoSet, e))?;
            }
        }
        self.rows.fetch_add(1, Ordering::Relaxed);
        handles.metrics.increment_rows(1);
        Ok(())
    }

    /// Running -> Completed. Has no effect once the split failed.
    pub(crate) fn complete(&self) {
        let won = self
            .state
            .compare_exchange(
                SplitState::Running as u8,
                SplitState::Completed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            self.handles.metrics.increment_splits_finished(1);
            debug!(split_id = self.split_id, rows = self.rows(), "Split exhausted");
        }
    }

    /// Claims the failure; only the winning caller logs, records the error and
    /// raises the stop signal. Returns whether this call won.
    pub(crate) fn fail(&self, stage: ScanStage, err: ClientError) -> bool {
        let won = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s != SplitState::Failed as u8).then_some(SplitState::Failed as u8)
            })
            .is_ok();
        if !won {
            return false;
        }

        let message = match err.code() {
            Some(code) => self.handles.client.error_string(code),
            None => err.to_string(),
        };
        error!(
            split_id = self.split_id,
            stage = %stage,
            error = %message,
            "Split failed"
        );
        let _ = self.failure.set(SplitFailure {
            split_id: self.split_id,
            stage,
            message,
        });
        self.handles.metrics.increment_failures(1);
        self.handles.stop.cancel();
        true
    }

    /// Waits until no unit of this split holds a slot.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.handles.idle.notified();
            if self.is_quiescent() {
                return;
            }
            notified.await;
        }
    }

    /// Outcome as seen once the split is quiescent.
    pub fn outcome(&self) -> SplitOutcome {
        match self.state() {
            SplitState::Completed => SplitOutcome::Exhausted,
            SplitState::Failed => SplitOutcome::Failed,
            SplitState::Running => SplitOutcome::Cancelled,
        }
    }

    pub fn report(&self) -> SplitReport {
        SplitReport {
            split_id: self.split_id,
            rows: self.rows(),
            outcome: self.outcome(),
            error: self.failure.get().map(|f| f.message.clone()),
            size_stats: self.size_stats.as_ref().map(SizeStats::snapshot),
            top_rows: self
                .top_k
                .as_ref()
                .map(BoundedTopK::sorted)
                .unwrap_or_default(),
        }
    }
}

async fn with_deadline<F>(timeout: Duration, request: F) -> Result<(), ClientError>
where
    F: std::future::Future<Output = Result<(), ClientError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(timeout)),
    }
}
