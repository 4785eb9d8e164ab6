//! Per-partition performance counter names.
//!
//! Counters exported by replica servers are named
//! `<section>*<metric>@<app_id>.<partition_index>`, e.g.
//! `replica*app.pegasus*get_qps@2.5`. Only the part after the last `*`
//! before `@` is the metric; the section may itself contain `*`.

use crate::{
    core::identifiers::{AppId, PartitionIndex},
    error::MetricNameError,
};
use std::fmt;

/// Section that every per-table counter lives under.
pub const APP_COUNTER_SECTION: &str = "replica*app.pegasus";

/// A decoded per-partition counter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricWireName {
    pub app_id: AppId,
    pub partition_index: PartitionIndex,
    pub metric: String,
}

impl MetricWireName {
    pub fn new(app_id: AppId, partition_index: PartitionIndex, metric: impl Into<String>) -> Self {
        Self {
            app_id,
            partition_index,
            metric: metric.into(),
        }
    }

    /// Splits `name` at its last `@`, reads the `<app_id>.<partition_index>`
    /// suffix as two decimal i32s and takes the metric from after the last
    /// `*` of the prefix.
    pub fn parse(name: &str) -> Result<Self, MetricNameError> {
        let at = name
            .rfind('@')
            .ok_or_else(|| MetricNameError::MissingAt(name.to_string()))?;
        let (prefix, suffix) = (&name[..at], &name[at + 1..]);

        let bad_suffix = || MetricNameError::BadSuffix(name.to_string());
        let (app, partition) = suffix.split_once('.').ok_or_else(bad_suffix)?;
        let app_id = parse_i32(app).ok_or_else(bad_suffix)?;
        let partition_index = parse_i32(partition).ok_or_else(bad_suffix)?;

        let star = prefix
            .rfind('*')
            .ok_or_else(|| MetricNameError::MissingStar(name.to_string()))?;

        Ok(Self {
            app_id,
            partition_index,
            metric: prefix[star + 1..].to_string(),
        })
    }

    /// Encodes the name under the given section, the inverse of [`parse`].
    ///
    /// [`parse`]: MetricWireName::parse
    pub fn to_wire(&self, section: &str) -> String {
        format!(
            "{}*{}@{}.{}",
            section, self.metric, self.app_id, self.partition_index
        )
    }
}

impl fmt::Display for MetricWireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.metric, self.app_id, self.partition_index)
    }
}

// `str::parse::<i32>` accepts a leading '+', which the wire format never emits.
fn parse_i32(s: &str) -> Option<i32> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Regex matching every per-partition counter of every table.
pub fn all_apps_filter() -> String {
    r".*\*app\.pegasus\*.*@.*".to_string()
}

/// Regex matching every per-partition counter of table `app_id`.
pub fn app_filter(app_id: AppId) -> String {
    format!(r".*\*app\.pegasus\*.*@{}\..*", app_id)
}
