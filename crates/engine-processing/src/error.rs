use engine_core::error::MetaError;
use model::{
    cluster::node::NodeRole,
    core::identifiers::{AppId, NodeAddress, PartitionIndex},
    error::{MetricNameError, UnknownCounter},
};
use std::fmt;
use thiserror::Error;

/// Request that failed inside a scan unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    ScanNext,
    Set,
    Del,
    GeoSet,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanStage::ScanNext => "scan next",
            ScanStage::Set => "set",
            ScanStage::Del => "del",
            ScanStage::GeoSet => "geo set",
        })
    }
}

/// First error of a split, kept by whichever unit claimed the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("split {split_id}: {stage} failed: {message}")]
pub struct SplitFailure {
    pub split_id: usize,
    pub stage: ScanStage,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to list {role} nodes: {source}")]
    ListNodes {
        role: NodeRole,
        #[source]
        source: MetaError,
    },
}

#[derive(Error, Debug)]
pub enum StatError {
    #[error("Failed to list apps: {0}")]
    ListApps(#[source] MetaError),

    #[error("App '{0}' not found")]
    AppNotFound(String),

    #[error("Failed to list partitions of app '{app_name}': {source}")]
    ListApp {
        app_name: String,
        #[source]
        source: MetaError,
    },

    #[error("Partition assignment of app '{app_name}' is inconsistent: {reason}")]
    AssignmentMismatch { app_name: String, reason: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Query perf counters from node {node} failed: {reason}")]
    NodeQuery { node: NodeAddress, reason: String },

    #[error("Decode perf counters from node {node} failed: {source}")]
    Decode {
        node: NodeAddress,
        #[source]
        source: serde_json::Error,
    },

    #[error("Query perf counters from node {node} returned result '{result}'")]
    NodeResult { node: NodeAddress, result: String },

    #[error("Malformed counter name from node {node}: {source}")]
    MetricName {
        node: NodeAddress,
        #[source]
        source: MetricNameError,
    },

    #[error("Counter from node {node}: {source}")]
    UnknownCounter {
        node: NodeAddress,
        #[source]
        source: UnknownCounter,
    },

    #[error("Counter from node {node} belongs to app {app_id}, expected {expected}")]
    ForeignApp {
        node: NodeAddress,
        app_id: AppId,
        expected: AppId,
    },

    #[error("Partition {app_id}.{partition_index} out of range (partition count {partition_count})")]
    PartitionOutOfRange {
        app_id: AppId,
        partition_index: PartitionIndex,
        partition_count: i32,
    },
}
