use crate::error::ClientError;
use async_trait::async_trait;
use model::records::record::KvRecord;
use std::time::Duration;

/// Options handed to the scanner factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub timeout: Duration,
    /// Skip fetching values; set when only keys and counts are needed.
    pub no_value: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            no_value: false,
        }
    }
}

/// Sequential reader over one partition split.
#[async_trait]
pub trait PartitionScanner: Send + Sync {
    /// Next record, or `None` once the split is exhausted.
    async fn next(&mut self) -> Result<Option<KvRecord>, ClientError>;
}

#[async_trait]
pub trait ScannerFactory: Send + Sync {
    /// Splits the table into at most `max_split_count` unordered scanners.
    async fn unordered_scanners(
        &self,
        max_split_count: usize,
        options: &ScanOptions,
    ) -> Result<Vec<Box<dyn PartitionScanner>>, ClientError>;
}
