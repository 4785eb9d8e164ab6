//! In-memory stand-ins for the cluster collaborators.

use async_trait::async_trait;
use engine_core::{
    connectors::{
        command::CommandChannel,
        kv::{GeoClient, KvClient},
        meta::MetaClient,
        scanner::{PartitionScanner, ScanOptions, ScannerFactory},
    },
    error::{ClientError, MetaError, TransportError},
};
use model::{
    cluster::{
        app::{AppInfo, AppPartitions, AppStatus, PartitionConfiguration},
        command::RemoteCommand,
    },
    core::identifiers::NodeAddress,
    records::record::KvRecord,
    stats::metric_name::{APP_COUNTER_SECTION, MetricWireName},
};
use serde_json::json;
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

type Key = (Vec<u8>, Vec<u8>);

/// Shared sorted map standing in for a table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Arc<Mutex<BTreeMap<Key, Vec<u8>>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: &KvRecord) {
        self.rows.lock().unwrap().insert(
            (record.hash_key.clone(), record.sort_key.clone()),
            record.value.clone(),
        );
    }

    pub fn remove(&self, hash_key: &[u8], sort_key: &[u8]) {
        self.rows
            .lock()
            .unwrap()
            .remove(&(hash_key.to_vec(), sort_key.to_vec()));
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<KvRecord> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|((h, s), v)| KvRecord::new(h.clone(), s.clone(), v.clone()))
            .collect()
    }
}

/// `count` records `user:<n>` / `attr` with values of `value_len` bytes.
pub fn records(prefix: &str, count: usize, value_len: usize) -> Vec<KvRecord> {
    (0..count)
        .map(|n| KvRecord::new(format!("{prefix}:{n}"), "attr", vec![b'v'; value_len]))
        .collect()
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    after: usize,
    error: ClientError,
}

pub struct MemoryScanner {
    records: VecDeque<KvRecord>,
    served: usize,
    failure: Option<InjectedFailure>,
    delay: Option<Duration>,
    no_value: bool,
}

#[async_trait]
impl PartitionScanner for MemoryScanner {
    async fn next(&mut self) -> Result<Option<KvRecord>, ClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = &self.failure {
            if self.served == failure.after {
                return Err(failure.error.clone());
            }
        }
        let Some(mut record) = self.records.pop_front() else {
            return Ok(None);
        };
        self.served += 1;
        if self.no_value {
            record.value.clear();
        }
        Ok(Some(record))
    }
}

/// Hands out one scanner per configured split.
#[derive(Default)]
pub struct MemoryScannerFactory {
    splits: Vec<Vec<KvRecord>>,
    failures: HashMap<usize, InjectedFailure>,
    delay: Option<Duration>,
    listing_error: Option<ClientError>,
    seen_options: Mutex<Vec<ScanOptions>>,
}

impl MemoryScannerFactory {
    pub fn new(splits: Vec<Vec<KvRecord>>) -> Self {
        Self {
            splits,
            ..Default::default()
        }
    }

    /// Split `split` fails its fetch once `after` records were served.
    pub fn fail_split(mut self, split: usize, after: usize, error: ClientError) -> Self {
        self.failures.insert(split, InjectedFailure { after, error });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_listing(mut self, error: ClientError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn seen_options(&self) -> Vec<ScanOptions> {
        self.seen_options.lock().unwrap().clone()
    }

    pub fn scanner(&self, split: usize, no_value: bool) -> MemoryScanner {
        MemoryScanner {
            records: self.splits[split].iter().cloned().collect(),
            served: 0,
            failure: self.failures.get(&split).cloned(),
            delay: self.delay,
            no_value,
        }
    }
}

#[async_trait]
impl ScannerFactory for MemoryScannerFactory {
    async fn unordered_scanners(
        &self,
        max_split_count: usize,
        options: &ScanOptions,
    ) -> Result<Vec<Box<dyn PartitionScanner>>, ClientError> {
        self.seen_options.lock().unwrap().push(options.clone());
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }

        // Surplus splits are folded round-robin into the first `max_split_count`.
        let groups = max_split_count.min(self.splits.len());
        let mut scanners: Vec<MemoryScanner> = (0..groups)
            .map(|split| self.scanner(split, options.no_value))
            .collect();
        for split in groups..self.splits.len() {
            let extra = self.scanner(split, options.no_value);
            scanners[split % groups].records.extend(extra.records);
        }
        Ok(scanners
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn PartitionScanner>)
            .collect())
    }
}

/// KV client writing into a [`MemoryTable`] that tracks request concurrency.
pub struct MemoryKvClient {
    pub table: MemoryTable,
    delay: Option<Duration>,
    fail_key: Option<(Vec<u8>, i32)>,
    fail_all: Option<i32>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryKvClient {
    pub fn new(table: MemoryTable) -> Self {
        Self {
            table,
            delay: None,
            fail_key: None,
            fail_all: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests on `hash_key` fail with status `code`.
    pub fn fail_on(mut self, hash_key: &str, code: i32) -> Self {
        self.fail_key = Some((hash_key.as_bytes().to_vec(), code));
        self
    }

    pub fn fail_always(mut self, code: i32) -> Self {
        self.fail_all = Some(code);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn request(&self, hash_key: &[u8]) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(code) = self.fail_all {
            return Err(ClientError::Status(code));
        }
        match &self.fail_key {
            Some((key, code)) if key.as_slice() == hash_key => Err(ClientError::Status(*code)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl KvClient for MemoryKvClient {
    async fn set(
        &self,
        hash_key: &[u8],
        sort_key: &[u8],
        value: &[u8],
        _timeout: Duration,
    ) -> Result<(), ClientError> {
        self.request(hash_key).await?;
        self.table
            .insert(&KvRecord::new(hash_key, sort_key, value));
        Ok(())
    }

    async fn del(
        &self,
        hash_key: &[u8],
        sort_key: &[u8],
        _timeout: Duration,
    ) -> Result<(), ClientError> {
        self.request(hash_key).await?;
        self.table.remove(hash_key, sort_key);
        Ok(())
    }

    fn error_string(&self, code: i32) -> String {
        format!("ERR_STATUS_{code}")
    }
}

/// Geo client recording every indexed record.
#[derive(Default)]
pub struct MemoryGeoClient {
    pub index: MemoryTable,
}

#[async_trait]
impl GeoClient for MemoryGeoClient {
    async fn set(
        &self,
        hash_key: &[u8],
        sort_key: &[u8],
        value: &[u8],
        _timeout: Duration,
    ) -> Result<(), ClientError> {
        self.index.insert(&KvRecord::new(hash_key, sort_key, value));
        Ok(())
    }
}

/// Meta client serving a fixed cluster layout.
#[derive(Default)]
pub struct MockMeta {
    pub meta_servers: Vec<NodeAddress>,
    pub replicas: Vec<NodeAddress>,
    pub apps: Vec<AppInfo>,
    pub partitions: HashMap<String, AppPartitions>,
    pub fail_list_nodes: bool,
    pub list_nodes_calls: AtomicUsize,
}

#[async_trait]
impl MetaClient for MockMeta {
    fn meta_servers(&self) -> Vec<NodeAddress> {
        self.meta_servers.clone()
    }

    async fn list_alive_nodes(&self) -> Result<Vec<NodeAddress>, MetaError> {
        self.list_nodes_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_nodes {
            return Err(MetaError::Unreachable("meta1:34601".to_string()));
        }
        Ok(self.replicas.clone())
    }

    async fn list_apps(&self, status: AppStatus) -> Result<Vec<AppInfo>, MetaError> {
        Ok(self
            .apps
            .iter()
            .filter(|app| app.status == status)
            .cloned()
            .collect())
    }

    async fn list_app(&self, app_name: &str) -> Result<AppPartitions, MetaError> {
        self.partitions
            .get(app_name)
            .cloned()
            .ok_or_else(|| MetaError::request("list_app", format!("{app_name} not found")))
    }
}

/// Scripted behavior of one node.
#[derive(Debug, Clone)]
pub enum NodeBehavior {
    Reply(String),
    Fail(TransportError),
    /// Never answers.
    Hang,
}

#[derive(Default)]
pub struct MockChannel {
    behaviors: HashMap<NodeAddress, NodeBehavior>,
    calls: Mutex<Vec<(NodeAddress, RemoteCommand)>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, node: &str, behavior: NodeBehavior) -> Self {
        self.behaviors.insert(NodeAddress::from(node), behavior);
        self
    }

    pub fn calls(&self) -> Vec<(NodeAddress, RemoteCommand)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandChannel for MockChannel {
    async fn call(
        &self,
        node: &NodeAddress,
        command: &RemoteCommand,
        _timeout: Duration,
    ) -> Result<String, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((node.clone(), command.clone()));
        let behavior = self.behaviors.get(node).cloned();
        match behavior {
            Some(NodeBehavior::Reply(payload)) => Ok(payload),
            Some(NodeBehavior::Fail(err)) => Err(err),
            Some(NodeBehavior::Hang) => {
                std::future::pending::<Result<String, TransportError>>().await
            }
            None => Err(TransportError::Unreachable(node.to_string())),
        }
    }
}

pub fn app(app_id: i32, app_name: &str, partition_count: i32) -> AppInfo {
    AppInfo {
        app_id,
        app_name: app_name.to_string(),
        partition_count,
        status: AppStatus::Available,
    }
}

/// Assignment where partition `i` has `primaries[i]` as primary.
pub fn assignment(app_id: i32, primaries: &[&str]) -> AppPartitions {
    AppPartitions {
        app_id,
        partition_count: primaries.len() as i32,
        partitions: primaries
            .iter()
            .enumerate()
            .map(|(idx, primary)| PartitionConfiguration {
                partition_index: idx as i32,
                primary: Some(NodeAddress::from(*primary)),
                secondaries: vec![],
            })
            .collect(),
    }
}

/// `(app_id, partition_index, metric, value)` encoded as a perf-counters reply.
pub fn perf_reply(counters: &[(i32, i32, &str, f64)]) -> String {
    let counters: Vec<_> = counters
        .iter()
        .map(|(app_id, partition, metric, value)| {
            json!({
                "name": MetricWireName::new(*app_id, *partition, *metric).to_wire(APP_COUNTER_SECTION),
                "type": "NUMBER",
                "value": value,
            })
        })
        .collect();
    json!({
        "result": "OK",
        "timestamp": 1_700_000_000,
        "timestamp_str": "2023-11-14 22:13:20",
        "counters": counters,
    })
    .to_string()
}

/// A reply carrying raw counter names, for malformed-name cases.
pub fn raw_perf_reply(names: &[(&str, f64)]) -> String {
    let counters: Vec<_> = names
        .iter()
        .map(|(name, value)| json!({"name": name, "type": "NUMBER", "value": value}))
        .collect();
    json!({"result": "OK", "timestamp": 0, "timestamp_str": "", "counters": counters}).to_string()
}
