use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: anyhow::Error,
    },
    #[error("{command} exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("{command} did not report a container id")]
    MissingContainerId { command: String },
    #[error("Unexpected output from {command}: {output}")]
    UnexpectedOutput { command: String, output: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DockerError>;
