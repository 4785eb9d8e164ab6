use crate::error::RunError;
use chrono::Utc;
use engine_config::{
    report::scan::{ScanReport, SplitOutcome},
    settings::ScanSettings,
};
use engine_core::{
    connectors::{
        kv::{GeoClient, KvClient},
        scanner::{ScanOptions, ScannerFactory},
    },
    metrics::Metrics,
};
use engine_processing::scan::{RunHandles, ScanTask, SplitOptions, drive};
use model::execution::operation::ScanOperation;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Notify,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Collaborators of one scan run.
#[derive(Clone)]
pub struct ScanJob {
    pub scanners: Arc<dyn ScannerFactory>,
    /// Write target for copy, delete target for clear.
    pub client: Arc<dyn KvClient>,
    /// Required by derive-geo-index.
    pub geo: Option<Arc<dyn GeoClient>>,
}

/// Runs `settings.operation` over every split of the job's table and waits
/// until every split is quiescent. Cancelling `cancel` stops all splits.
pub async fn run(
    job: ScanJob,
    settings: ScanSettings,
    cancel: CancellationToken,
) -> Result<ScanReport, RunError> {
    ScanExecutor::new(job, settings, cancel).execute().await
}

struct ScanExecutor {
    job: ScanJob,
    settings: ScanSettings,
    cancel: CancellationToken,
    run_id: Uuid,
}

impl ScanExecutor {
    fn new(job: ScanJob, settings: ScanSettings, cancel: CancellationToken) -> Self {
        Self {
            job,
            settings,
            cancel,
            run_id: Uuid::new_v4(),
        }
    }

    async fn execute(self) -> Result<ScanReport, RunError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let operation = self.settings.operation;
        info!(run_id = %self.run_id, operation = %operation, "Starting scan run");

        if operation == ScanOperation::DeriveGeoIndex && self.job.geo.is_none() {
            return Err(RunError::MissingGeoClient(operation));
        }

        let options = ScanOptions {
            timeout: self.settings.timeout,
            no_value: self.settings.no_value(),
        };
        let scanners = self
            .job
            .scanners
            .unordered_scanners(self.settings.max_split_count, &options)
            .await
            .map_err(RunError::ListScanners)?;
        info!(run_id = %self.run_id, splits = scanners.len(), "Opened scanners");

        let handles = RunHandles {
            client: self.job.client.clone(),
            geo: self.job.geo.clone(),
            stop: self.cancel.child_token(),
            metrics: Metrics::new(),
            idle: Arc::new(Notify::new()),
        };
        let split_options = SplitOptions {
            operation,
            max_in_flight: self.settings.max_batch_count,
            timeout: self.settings.timeout,
            collect_size_stats: self.settings.stat_size,
            top_count: self.settings.top_count,
        };
        let tasks: Vec<Arc<ScanTask>> = scanners
            .into_iter()
            .enumerate()
            .map(|(split_id, scanner)| {
                Arc::new(ScanTask::new(
                    split_id,
                    scanner,
                    split_options.clone(),
                    handles.clone(),
                ))
            })
            .collect();

        for task in &tasks {
            drive(task);
        }
        self.wait_quiescent(&tasks, &handles, start).await;

        let report = ScanReport {
            run_id: self.run_id,
            operation,
            started_at,
            elapsed: start.elapsed(),
            metrics: handles.metrics.snapshot(),
            splits: tasks.iter().map(|task| task.report()).collect(),
        };

        let cancelled = report
            .splits
            .iter()
            .filter(|s| s.outcome == SplitOutcome::Cancelled)
            .count();
        if cancelled > 0 {
            warn!(run_id = %self.run_id, cancelled, "Scan run stopped before all splits finished");
        }
        info!(
            run_id = %self.run_id,
            rows = report.total_rows(),
            succeeded = report.succeeded(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Scan run finished"
        );
        Ok(report)
    }

    async fn wait_quiescent(&self, tasks: &[Arc<ScanTask>], handles: &RunHandles, start: Instant) {
        let interval = self.settings.progress_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let notified = handles.idle.notified();
            if tasks.iter().all(|task| task.is_quiescent()) {
                return;
            }
            tokio::select! {
                _ = notified => {}
                _ = ticker.tick() => {
                    let rows = handles.metrics.rows_processed();
                    let secs = start.elapsed().as_secs_f64();
                    let rate = if secs > 0.0 { rows as f64 / secs } else { 0.0 };
                    info!(
                        run_id = %self.run_id,
                        rows,
                        rows_per_sec = %format!("{rate:.1}"),
                        "Scan progress"
                    );
                }
            }
        }
    }
}
