use crate::settings::error::SettingsError;
use model::execution::operation::ScanOperation;
use std::time::Duration;

pub const DEFAULT_MAX_BATCH_COUNT: usize = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Large enough that the factory returns one split per partition.
pub const DEFAULT_MAX_SPLIT_COUNT: usize = 100_000_000;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Immutable, validated configuration of one scan run.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub operation: ScanOperation,
    /// Concurrent requests allowed per split.
    pub max_batch_count: usize,
    /// Deadline of every fetch, write and delete.
    pub timeout: Duration,
    pub max_split_count: usize,
    pub progress_interval: Duration,
    /// Record size histograms (count only).
    pub stat_size: bool,
    /// Largest rows to retain per split when `stat_size` is on.
    pub top_count: usize,
}

impl ScanSettings {
    pub fn builder(operation: ScanOperation) -> ScanSettingsBuilder {
        ScanSettingsBuilder::new(operation)
    }

    /// Count without size stats never looks at values.
    pub fn no_value(&self) -> bool {
        self.operation == ScanOperation::Count && !self.stat_size
    }
}

#[derive(Debug, Clone)]
pub struct ScanSettingsBuilder {
    operation: ScanOperation,
    max_batch_count: Option<usize>,
    timeout: Option<Duration>,
    max_split_count: Option<usize>,
    progress_interval: Option<Duration>,
    stat_size: bool,
    top_count: usize,
}

impl ScanSettingsBuilder {
    pub fn new(operation: ScanOperation) -> Self {
        Self {
            operation,
            max_batch_count: None,
            timeout: None,
            max_split_count: None,
            progress_interval: None,
            stat_size: false,
            top_count: 0,
        }
    }

    pub fn max_batch_count(mut self, max_batch_count: usize) -> Self {
        self.max_batch_count = Some(max_batch_count);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_split_count(mut self, max_split_count: usize) -> Self {
        self.max_split_count = Some(max_split_count);
        self
    }

    pub fn progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = Some(progress_interval);
        self
    }

    pub fn stat_size(mut self, stat_size: bool) -> Self {
        self.stat_size = stat_size;
        self
    }

    pub fn top_count(mut self, top_count: usize) -> Self {
        self.top_count = top_count;
        self
    }

    pub fn build(self) -> Result<ScanSettings, SettingsError> {
        let max_batch_count = self.max_batch_count.unwrap_or(DEFAULT_MAX_BATCH_COUNT);
        if max_batch_count == 0 {
            return Err(SettingsError::invalid(
                "max_batch_count",
                "must be at least 1",
            ));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(SettingsError::invalid("timeout", "must be positive"));
        }

        let max_split_count = self.max_split_count.unwrap_or(DEFAULT_MAX_SPLIT_COUNT);
        if max_split_count == 0 {
            return Err(SettingsError::invalid(
                "max_split_count",
                "must be at least 1",
            ));
        }

        let progress_interval = self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL);
        if progress_interval.is_zero() {
            return Err(SettingsError::invalid(
                "progress_interval",
                "must be positive",
            ));
        }

        if self.stat_size && self.operation != ScanOperation::Count {
            return Err(SettingsError::invalid(
                "stat_size",
                format!("only supported by count, not {}", self.operation),
            ));
        }
        if self.top_count > 0 && !self.stat_size {
            return Err(SettingsError::invalid("top_count", "requires stat_size"));
        }

        Ok(ScanSettings {
            operation: self.operation,
            max_batch_count,
            timeout,
            max_split_count,
            progress_interval,
            stat_size: self.stat_size,
            top_count: self.top_count,
        })
    }
}
