use crate::{
    error::ScanStage,
    scan::task::{Fetched, ScanTask},
};
use std::sync::Arc;
use tracing::trace;

/// Fills the split's free request slots with units.
///
/// Stops as soon as the split is no longer running, the stop signal is
/// raised or the budget is used up. Safe to call from any unit.
pub fn drive(task: &Arc<ScanTask>) {
    while task.can_issue() && task.try_acquire_slot() {
        let unit = Arc::clone(task);
        tokio::spawn(run_unit(unit));
    }
}

/// One slot's worth of work: fetch, apply, refill, repeat.
async fn run_unit(task: Arc<ScanTask>) {
    while task.can_issue() {
        match task.fetch_next().await {
            Ok(Fetched::Record(record)) => {
                if let Err((stage, err)) = task.apply(&record).await {
                    task.fail(stage, err);
                    break;
                }
                drive(&task);
            }
            Ok(Fetched::Exhausted) => {
                task.complete();
                break;
            }
            Ok(Fetched::Stopped) => break,
            Err(err) => {
                task.fail(ScanStage::ScanNext, err);
                break;
            }
        }
    }
    trace!(split_id = task.split_id(), "Unit finished");
    task.release_slot();
}
