// ABOUTME: Docker integration for observing development environment containers

pub mod containers;

pub use containers::{ContainerError, ContainerSource, DockerContainerSource};
