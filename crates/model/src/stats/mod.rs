pub mod metric_name;
pub mod perf_counter;
pub mod row;
