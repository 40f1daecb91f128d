use docker_cli::{DockerError, DockerVersion};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error(
        "The container engine version {found} is older than {minimum}; steps requiring 'exec' will not work"
    )]
    Version {
        found: DockerVersion,
        minimum: DockerVersion,
    },
    #[error("Failed to resolve container engine executable '{tool}': {message}")]
    ExecutableResolution { tool: String, message: String },
    #[error("Failed to run {operation} in container {container}: {message}")]
    Reap {
        operation: &'static str,
        container: String,
        message: String,
    },
    #[error("Failed to provision container from {image}: {source}")]
    Provisioning { image: String, source: DockerError },
    #[error("Failed to determine user for container {container}: {source}")]
    Identity {
        container: String,
        source: DockerError,
    },
    #[error("Failed to {operation} container {container}: {source}")]
    Engine {
        operation: &'static str,
        container: String,
        source: DockerError,
    },
    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scope record: {message}")]
    Record { message: String },
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("Launch request has an empty command line")]
    EmptyCommand,
}

pub type Result<T> = std::result::Result<T, ScopeError>;
