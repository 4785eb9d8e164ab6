use engine_config::report::scan::SizeStatsReport;
use engine_core::stats::histogram::Histogram;
use model::records::record::KvRecord;

/// Size histograms a count scan fills for its split.
#[derive(Debug, Default)]
pub struct SizeStats {
    hash_key: Histogram,
    sort_key: Histogram,
    value: Histogram,
    row: Histogram,
}

impl SizeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: &KvRecord) {
        self.hash_key.record(record.hash_key_size());
        self.sort_key.record(record.sort_key_size());
        self.value.record(record.value_size());
        self.row.record(record.row_size());
    }

    pub fn snapshot(&self) -> SizeStatsReport {
        SizeStatsReport {
            hash_key: self.hash_key.snapshot(),
            sort_key: self.sort_key.snapshot(),
            value: self.value.snapshot(),
            row: self.row.snapshot(),
        }
    }
}
