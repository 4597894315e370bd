// ABOUTME: Stateless aggregation of container and test-report sources into one snapshot

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::{MonitorConfig, Subproject};
use crate::docker::ContainerSource;
use crate::models::{ProjectStatus, TestSummary};
use crate::report::parse_report;

/// Derives `ProjectStatus` snapshots on demand.
///
/// Every call re-reads both sources from scratch; nothing is cached between
/// cycles, so an absent report file always yields a zero summary rather than
/// a stale one. Calls are side-effect free and safe to run concurrently.
pub struct StatusAggregator<S> {
    project_label: String,
    subprojects: Vec<Subproject>,
    source: S,
}

impl<S: ContainerSource> StatusAggregator<S> {
    pub fn new(config: &MonitorConfig, source: S) -> Self {
        Self {
            project_label: config.project_label.clone(),
            subprojects: config.subprojects.clone(),
            source,
        }
    }

    /// Compute one snapshot from the current state of both sources.
    ///
    /// An unreachable runtime degrades to an empty container list; the two
    /// sources are read independently, so the snapshot carries no
    /// cross-source consistency guarantee beyond "both reads happened now".
    pub async fn aggregate(&self) -> ProjectStatus {
        let containers = match self.source.list_containers(&self.project_label).await {
            Ok(containers) => containers,
            Err(e) => {
                warn!("Error getting container status: {}", e);
                Vec::new()
            }
        };

        let mut tests = BTreeMap::new();
        for subproject in &self.subprojects {
            let summary = if subproject.report_path.exists() {
                parse_report(&subproject.report_path)
            } else {
                TestSummary::default()
            };
            tests.insert(subproject.name.clone(), summary);
        }

        ProjectStatus { containers, tests }
    }
}
