// ABOUTME: Status aggregation composing container state and test summaries into snapshots

pub mod aggregator;

pub use aggregator::StatusAggregator;
