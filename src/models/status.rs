// ABOUTME: Status snapshot types broadcast to observers: container records,
// per-subproject test summaries, and the composed project status

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a container as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Map a runtime state string to a known state. Anything unrecognized
    /// (including the transient `removing` state) maps to `Unknown`.
    pub fn from_runtime(state: &str) -> Self {
        match state {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// One container belonging to the monitored project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    pub status: ContainerState,
    pub id: String,
}

/// Outcome of one subproject's latest test run.
///
/// `error` is set exclusively when the report file could not be parsed; the
/// counts are then zero, which keeps "bad data" distinguishable from "zero
/// tests ran".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: u64,
    pub failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestSummary {
    pub fn new(passed: u64, failed: u64) -> Self {
        Self {
            passed,
            failed,
            error: None,
        }
    }

    /// Summary for a report that could not be read or parsed.
    pub fn parse_error(diagnostic: impl Into<String>) -> Self {
        Self {
            passed: 0,
            failed: 0,
            error: Some(diagnostic.into()),
        }
    }
}

/// The single unit of broadcast: a wholesale snapshot of the environment,
/// recomputed on every aggregation cycle and never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub containers: Vec<ContainerInfo>,
    pub tests: BTreeMap<String, TestSummary>,
}
