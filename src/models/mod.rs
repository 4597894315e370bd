// ABOUTME: Data model for aggregated development environment status

pub mod status;

pub use status::{ContainerInfo, ContainerState, ProjectStatus, TestSummary};
