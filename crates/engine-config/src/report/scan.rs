use chrono::{DateTime, Utc};
use engine_core::{metrics::MetricsSnapshot, stats::histogram::HistogramSnapshot};
use model::{execution::operation::ScanOperation, records::top::TopRow};
use serde::{Serialize, Serializer};
use std::time::Duration;
use uuid::Uuid;

/// How a split ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitOutcome {
    /// The scanner ran out of records.
    Exhausted,
    /// A request failed; the split was abandoned.
    Failed,
    /// Stopped by a sibling's failure or by the caller.
    Cancelled,
}

/// Hash key, sort key, value and whole-row size distributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeStatsReport {
    pub hash_key: HistogramSnapshot,
    pub sort_key: HistogramSnapshot,
    pub value: HistogramSnapshot,
    pub row: HistogramSnapshot,
}

impl SizeStatsReport {
    pub fn merge(&mut self, other: &SizeStatsReport) {
        self.hash_key.merge(&other.hash_key);
        self.sort_key.merge(&other.sort_key);
        self.value.merge(&other.value);
        self.row.merge(&other.row);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub split_id: usize,
    pub rows: u64,
    pub outcome: SplitOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_stats: Option<SizeStatsReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_rows: Vec<TopRow>,
}

/// Final report of a scan run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    pub operation: ScanOperation,
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub metrics: MetricsSnapshot,
    pub splits: Vec<SplitReport>,
}

impl ScanReport {
    pub fn total_rows(&self) -> u64 {
        self.splits.iter().map(|s| s.rows).sum()
    }

    /// True when every split ran its scanner to the end.
    pub fn succeeded(&self) -> bool {
        self.splits
            .iter()
            .all(|s| s.outcome == SplitOutcome::Exhausted)
    }

    pub fn failed_splits(&self) -> impl Iterator<Item = &SplitReport> {
        self.splits
            .iter()
            .filter(|s| s.outcome == SplitOutcome::Failed)
    }

    pub fn first_error(&self) -> Option<&str> {
        self.splits.iter().find_map(|s| s.error.as_deref())
    }

    /// Size distributions of all splits merged, if any were recorded.
    pub fn size_stats(&self) -> Option<SizeStatsReport> {
        let mut stats = self.splits.iter().filter_map(|s| s.size_stats.as_ref());
        let mut merged = stats.next()?.clone();
        for other in stats {
            merged.merge(other);
        }
        Some(merged)
    }

    /// Largest `limit` rows across all splits, largest first.
    pub fn top_rows(&self, limit: usize) -> Vec<TopRow> {
        let mut rows: Vec<TopRow> = self
            .splits
            .iter()
            .flat_map(|s| s.top_rows.iter().cloned())
            .collect();
        rows.sort_by(|a, b| b.row_size.cmp(&a.row_size));
        rows.truncate(limit);
        rows
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(elapsed.as_millis())
}
