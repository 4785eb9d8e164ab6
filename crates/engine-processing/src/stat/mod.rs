pub mod aggregator;

pub use aggregator::StatAggregator;
