// ABOUTME: Container snapshot provider querying the Docker runtime via Bollard
// Lists project containers (stopped included) and maps them to status records

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::Docker;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::models::{ContainerInfo, ContainerState};

/// Label every compose-managed container carries; the value is the project name.
const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";

/// Length of the short container id shown to observers.
const SHORT_ID_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Docker connection error: {0}")]
    Connection(#[from] bollard::errors::Error),
    #[error("Docker daemon is not available")]
    Unavailable,
}

/// Read-only source of container status records for one project.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContainerSource: Send + Sync {
    /// List all containers (running or not) labelled with the given compose
    /// project, in the runtime's native listing order.
    async fn list_containers(
        &self,
        project_label: &str,
    ) -> Result<Vec<ContainerInfo>, ContainerError>;
}

/// Bollard-backed container source.
///
/// Construction never fails: if the daemon cannot be reached the source
/// stays in a degraded state where every query reports it unavailable, and
/// the aggregation layer falls back to an empty container list.
pub struct DockerContainerSource {
    docker: Option<Docker>,
}

impl DockerContainerSource {
    pub async fn connect() -> Self {
        match Self::try_connect().await {
            Ok(docker) => {
                info!("Successfully connected to Docker daemon");
                Self {
                    docker: Some(docker),
                }
            }
            Err(e) => {
                error!("Failed to connect to Docker daemon: {}", e);
                Self { docker: None }
            }
        }
    }

    async fn try_connect() -> Result<Docker, bollard::errors::Error> {
        let docker = Self::connect_to_docker()?;

        // Test the connection
        docker.ping().await?;
        Ok(docker)
    }

    fn connect_to_docker() -> Result<Docker, bollard::errors::Error> {
        // Honor an explicit DOCKER_HOST first
        if let Ok(docker_host) = std::env::var("DOCKER_HOST") {
            info!("Using DOCKER_HOST: {}", docker_host);
            return Docker::connect_with_local_defaults();
        }

        // Probe well-known socket locations
        for socket_path in Self::docker_socket_paths() {
            if std::path::Path::new(&socket_path).exists() {
                info!("Found Docker socket at: {}", socket_path);
                std::env::set_var("DOCKER_HOST", format!("unix://{}", socket_path));

                match Docker::connect_with_local_defaults() {
                    Ok(docker) => return Ok(docker),
                    Err(e) => {
                        warn!("Failed to connect to Docker socket {}: {}", socket_path, e);
                        continue;
                    }
                }
            }
        }

        // Fall back to default connection
        warn!("No Docker socket found, trying default connection");
        Docker::connect_with_local_defaults()
    }

    fn docker_socket_paths() -> Vec<String> {
        let mut paths = vec!["/var/run/docker.sock".to_string()];

        // Rootless Docker and Podman
        if let Ok(xdg_runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
            paths.push(format!("{}/docker.sock", xdg_runtime_dir));
            paths.push(format!("{}/podman/podman.sock", xdg_runtime_dir));
        }

        paths
    }
}

#[async_trait]
impl ContainerSource for DockerContainerSource {
    async fn list_containers(
        &self,
        project_label: &str,
    ) -> Result<Vec<ContainerInfo>, ContainerError> {
        let docker = self.docker.as_ref().ok_or(ContainerError::Unavailable)?;

        let containers = docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters: {
                    let mut filters = HashMap::new();
                    filters.insert(
                        "label".to_string(),
                        vec![format!("{}={}", COMPOSE_PROJECT_LABEL, project_label)],
                    );
                    filters
                },
                ..Default::default()
            }))
            .await?;

        debug!(
            "Runtime reported {} containers for project {}",
            containers.len(),
            project_label
        );

        Ok(containers
            .into_iter()
            .map(|summary| {
                let name = summary
                    .names
                    .as_ref()
                    .and_then(|names| names.first())
                    .map(|name| name.trim_start_matches('/').to_string())
                    .unwrap_or_default();
                let id = summary.id.as_deref().map(short_id).unwrap_or_default();
                let status = summary
                    .state
                    .as_deref()
                    .map_or(ContainerState::Unknown, ContainerState::from_runtime);

                ContainerInfo { name, status, id }
            })
            .collect())
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_ids() {
        let full = "ab12cd34ef56a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2";
        assert_eq!(short_id(full), "ab12cd34ef56");
    }

    #[test]
    fn short_id_keeps_already_short_ids() {
        assert_eq!(short_id("ab12"), "ab12");
    }

    #[tokio::test]
    async fn degraded_source_reports_unavailable() {
        let source = DockerContainerSource { docker: None };
        let result = source.list_containers("my-dev-env").await;

        assert!(matches!(result, Err(ContainerError::Unavailable)));
    }
}
