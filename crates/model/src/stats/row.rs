use crate::error::UnknownCounter;
use serde::Serialize;
use std::str::FromStr;

/// Per-table counters folded into a [`StatRow`], keyed by their metric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppCounter {
    GetQps,
    MultiGetQps,
    PutQps,
    MultiPutQps,
    RemoveQps,
    MultiRemoveQps,
    IncrQps,
    CheckAndSetQps,
    CheckAndMutateQps,
    ScanQps,
    RecentExpireCount,
    RecentFilterCount,
    RecentAbnormalCount,
    StorageMb,
    StorageCount,
    RdbBlockCacheHitCount,
    RdbBlockCacheTotalCount,
    RdbBlockCacheMemUsage,
    RdbIndexAndFilterBlocksMemUsage,
    RdbMemtableMemUsage,
}

impl AppCounter {
    pub const ALL: [AppCounter; 20] = [
        AppCounter::GetQps,
        AppCounter::MultiGetQps,
        AppCounter::PutQps,
        AppCounter::MultiPutQps,
        AppCounter::RemoveQps,
        AppCounter::MultiRemoveQps,
        AppCounter::IncrQps,
        AppCounter::CheckAndSetQps,
        AppCounter::CheckAndMutateQps,
        AppCounter::ScanQps,
        AppCounter::RecentExpireCount,
        AppCounter::RecentFilterCount,
        AppCounter::RecentAbnormalCount,
        AppCounter::StorageMb,
        AppCounter::StorageCount,
        AppCounter::RdbBlockCacheHitCount,
        AppCounter::RdbBlockCacheTotalCount,
        AppCounter::RdbBlockCacheMemUsage,
        AppCounter::RdbIndexAndFilterBlocksMemUsage,
        AppCounter::RdbMemtableMemUsage,
    ];

    /// Metric id as it appears in the counter's wire name.
    pub fn metric_id(&self) -> &'static str {
        match self {
            AppCounter::GetQps => "get_qps",
            AppCounter::MultiGetQps => "multi_get_qps",
            AppCounter::PutQps => "put_qps",
            AppCounter::MultiPutQps => "multi_put_qps",
            AppCounter::RemoveQps => "remove_qps",
            AppCounter::MultiRemoveQps => "multi_remove_qps",
            AppCounter::IncrQps => "incr_qps",
            AppCounter::CheckAndSetQps => "check_and_set_qps",
            AppCounter::CheckAndMutateQps => "check_and_mutate_qps",
            AppCounter::ScanQps => "scan_qps",
            AppCounter::RecentExpireCount => "recent.expire.count",
            AppCounter::RecentFilterCount => "recent.filter.count",
            AppCounter::RecentAbnormalCount => "recent.abnormal.count",
            AppCounter::StorageMb => "disk.storage.sst(MB)",
            AppCounter::StorageCount => "disk.storage.sst.count",
            AppCounter::RdbBlockCacheHitCount => "rdb.block_cache.hit_count",
            AppCounter::RdbBlockCacheTotalCount => "rdb.block_cache.total_count",
            AppCounter::RdbBlockCacheMemUsage => "rdb.block_cache.memory_usage",
            AppCounter::RdbIndexAndFilterBlocksMemUsage => {
                "rdb.index_and_filter_blocks.memory_usage"
            }
            AppCounter::RdbMemtableMemUsage => "rdb.memtable.memory_usage",
        }
    }
}

impl FromStr for AppCounter {
    type Err = UnknownCounter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppCounter::ALL
            .iter()
            .copied()
            .find(|counter| counter.metric_id() == s)
            .ok_or_else(|| UnknownCounter(s.to_string()))
    }
}

/// Summary row of one table (all-apps mode) or one partition (single-app mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatRow {
    pub row_name: String,
    pub get_qps: f64,
    pub multi_get_qps: f64,
    pub put_qps: f64,
    pub multi_put_qps: f64,
    pub remove_qps: f64,
    pub multi_remove_qps: f64,
    pub incr_qps: f64,
    pub check_and_set_qps: f64,
    pub check_and_mutate_qps: f64,
    pub scan_qps: f64,
    pub recent_expire_count: f64,
    pub recent_filter_count: f64,
    pub recent_abnormal_count: f64,
    pub storage_mb: f64,
    pub storage_count: f64,
    pub rdb_block_cache_hit_count: f64,
    pub rdb_block_cache_total_count: f64,
    pub rdb_block_cache_mem_usage: f64,
    pub rdb_index_and_filter_blocks_mem_usage: f64,
    pub rdb_memtable_mem_usage: f64,
}

impl StatRow {
    pub fn new(row_name: impl Into<String>) -> Self {
        Self {
            row_name: row_name.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, counter: AppCounter, value: f64) {
        *self.column_mut(counter) += value;
    }

    /// Adds `value` to the column named by `metric_id`.
    pub fn update(&mut self, metric_id: &str, value: f64) -> Result<(), UnknownCounter> {
        let counter = metric_id.parse::<AppCounter>()?;
        self.add(counter, value);
        Ok(())
    }
}

macro_rules! counter_columns {
    ($($variant:ident => $field:ident),* $(,)?) => {
        impl StatRow {
            pub fn get(&self, counter: AppCounter) -> f64 {
                match counter {
                    $(AppCounter::$variant => self.$field,)*
                }
            }

            fn column_mut(&mut self, counter: AppCounter) -> &mut f64 {
                match counter {
                    $(AppCounter::$variant => &mut self.$field,)*
                }
            }
        }
    };
}

counter_columns! {
    GetQps => get_qps,
    MultiGetQps => multi_get_qps,
    PutQps => put_qps,
    MultiPutQps => multi_put_qps,
    RemoveQps => remove_qps,
    MultiRemoveQps => multi_remove_qps,
    IncrQps => incr_qps,
    CheckAndSetQps => check_and_set_qps,
    CheckAndMutateQps => check_and_mutate_qps,
    ScanQps => scan_qps,
    RecentExpireCount => recent_expire_count,
    RecentFilterCount => recent_filter_count,
    RecentAbnormalCount => recent_abnormal_count,
    StorageMb => storage_mb,
    StorageCount => storage_count,
    RdbBlockCacheHitCount => rdb_block_cache_hit_count,
    RdbBlockCacheTotalCount => rdb_block_cache_total_count,
    RdbBlockCacheMemUsage => rdb_block_cache_mem_usage,
    RdbIndexAndFilterBlocksMemUsage => rdb_index_and_filter_blocks_mem_usage,
    RdbMemtableMemUsage => rdb_memtable_mem_usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates() {
        let mut row = StatRow::new("temp");
        row.update("get_qps", 5.0).unwrap();
        row.update("get_qps", 2.5).unwrap();
        row.update("disk.storage.sst(MB)", 100.0).unwrap();

        assert_eq!(row.get_qps, 7.5);
        assert_eq!(row.get(AppCounter::StorageMb), 100.0);
        assert_eq!(row.put_qps, 0.0);
    }

    #[test]
    fn test_update_rejects_unknown_counter() {
        let mut row = StatRow::new("temp");
        let err = row.update("replica.qps", 1.0).unwrap_err();
        assert_eq!(err, UnknownCounter("replica.qps".to_string()));
        assert_eq!(row, StatRow::new("temp"));
    }

    #[test]
    fn test_every_counter_has_distinct_column() {
        let mut row = StatRow::new("all");
        for (i, counter) in AppCounter::ALL.iter().enumerate() {
            row.add(*counter, i as f64 + 1.0);
        }
        for (i, counter) in AppCounter::ALL.iter().enumerate() {
            assert_eq!(row.get(*counter), i as f64 + 1.0, "{}", counter.metric_id());
        }
    }
}
