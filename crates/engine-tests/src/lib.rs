#![allow(dead_code)]

use engine_config::settings::{CommandSettings, ScanSettings};
use engine_core::connectors::{
    command::CommandChannel,
    kv::{GeoClient, KvClient},
    meta::MetaClient,
};
use engine_processing::cluster::CommandDispatcher;
use engine_runtime::execution::executor::ScanJob;
use model::execution::operation::ScanOperation;
use std::{sync::Arc, time::Duration};
use utils::MemoryScannerFactory;

pub mod stat;
pub mod utils;

/// Per-node command deadline used by tests that include hanging nodes.
pub const SHORT_COMMAND_TIMEOUT: Duration = Duration::from_millis(100);

pub fn scan_job(
    scanners: Arc<MemoryScannerFactory>,
    client: Arc<dyn KvClient>,
    geo: Option<Arc<dyn GeoClient>>,
) -> ScanJob {
    ScanJob {
        scanners,
        client,
        geo,
    }
}

/// Settings with a short progress interval so progress logging is exercised.
pub fn scan_settings(operation: ScanOperation, max_batch_count: usize) -> ScanSettings {
    ScanSettings::builder(operation)
        .max_batch_count(max_batch_count)
        .timeout(Duration::from_secs(2))
        .progress_interval(Duration::from_millis(20))
        .build()
        .expect("valid scan settings")
}

pub fn dispatcher(meta: Arc<dyn MetaClient>, channel: Arc<dyn CommandChannel>) -> CommandDispatcher {
    CommandDispatcher::new(
        meta,
        channel,
        CommandSettings::new(SHORT_COMMAND_TIMEOUT).expect("valid command settings"),
    )
}
