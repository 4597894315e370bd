// ABOUTME: Triggers that request aggregation cycles: filesystem changes and a poll timer

pub mod poll;
pub mod reports;

pub use poll::spawn_poll_trigger;
pub use reports::ReportWatcher;
