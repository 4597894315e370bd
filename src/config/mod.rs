// ABOUTME: Service configuration with defaults, optional TOML file, and env overrides

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// One monitored subproject and the report file its test runner writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subproject {
    pub name: String,
    pub report_path: PathBuf,
}

/// Runtime configuration for the monitor service.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Address the WebSocket endpoint listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Compose project name used to scope the container filter.
    #[serde(default = "default_project_label")]
    pub project_label: String,

    /// Directory tree watched for report file changes.
    #[serde(default = "default_watch_root")]
    pub watch_root: PathBuf,

    /// Interval between timer-driven refresh cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-observer outbound buffer, in messages. An observer that falls
    /// this far behind is dropped.
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,

    #[serde(default = "default_subprojects")]
    pub subprojects: Vec<Subproject>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            project_label: default_project_label(),
            watch_root: default_watch_root(),
            poll_interval_secs: default_poll_interval_secs(),
            observer_buffer: default_observer_buffer(),
            subprojects: default_subprojects(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides (`COMPOSE_PROJECT_NAME` takes precedence over the file).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                let config: Self = toml::from_str(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => Self::default(),
        };

        if let Ok(label) = std::env::var("COMPOSE_PROJECT_NAME") {
            config.project_label = label;
        }

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000)
}

fn default_project_label() -> String {
    "my-dev-env".to_string()
}

fn default_watch_root() -> PathBuf {
    PathBuf::from("/workspace")
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_observer_buffer() -> usize {
    64
}

fn default_subprojects() -> Vec<Subproject> {
    vec![
        Subproject {
            name: "backend".to_string(),
            report_path: PathBuf::from("/workspace/backend/test_output/backend_results.xml"),
        },
        Subproject {
            name: "frontend".to_string(),
            report_path: PathBuf::from("/workspace/frontend/test_output/frontend_results.xml"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_cover_both_subprojects() {
        let config = MonitorConfig::default();

        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.project_label, "my-dev-env");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        let names: Vec<&str> = config.subprojects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["backend", "frontend"]);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            bind_addr = "127.0.0.1:9100"
            poll_interval_secs = 2

            [[subprojects]]
            name = "api"
            report_path = "/srv/api/results.xml"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.project_label, "my-dev-env");
        assert_eq!(config.subprojects.len(), 1);
        assert_eq!(config.subprojects[0].name, "api");
    }
}
