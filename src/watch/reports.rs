// ABOUTME: Filesystem change trigger watching the report tree for test result writes
// Hands off to the service context via a channel; never touches state from the watcher thread

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::server::MonitorEvent;

/// File extension test runners give their reports; only matching writes
/// trigger a refresh.
const REPORT_EXTENSION: &str = "xml";

/// Recursive watcher over the report output tree.
///
/// The notify callback runs on a watcher-owned OS thread, outside the
/// service's scheduler; the only work done there is a thread-safe channel
/// send. Dropping the handle detaches the watches and releases the
/// underlying OS resources, which is how shutdown stops it.
pub struct ReportWatcher {
    _watcher: RecommendedWatcher,
}

impl ReportWatcher {
    pub fn spawn(
        root: &Path,
        events: mpsc::UnboundedSender<MonitorEvent>,
    ) -> Result<Self, notify::Error> {
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) => handle_event(&event, &events),
                Err(e) => warn!("File watcher error: {}", e),
            })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("Watching {} for report changes", root.display());

        Ok(Self { _watcher: watcher })
    }
}

fn handle_event(event: &Event, events: &mpsc::UnboundedSender<MonitorEvent>) {
    if !matches!(event.kind, EventKind::Modify(_)) {
        return;
    }

    for path in &event.paths {
        if path.extension().is_some_and(|ext| ext == REPORT_EXTENSION) {
            info!("Detected change in {}", path.display());
            // No coalescing: every matching write requests its own cycle
            let _ = events.send(MonitorEvent::Refresh);
        }
    }
}
