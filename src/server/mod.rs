// ABOUTME: WebSocket endpoint, observer registry, and the status monitor event loop

pub mod monitor;
pub mod registry;
pub mod ws;

pub use monitor::{MonitorEvent, StatusMonitor};
pub use registry::{Observer, Registry};
pub use ws::serve;
