//! Command-line client for a docker-compatible container engine.

pub mod cgroup;
pub mod client;
pub mod error;
pub mod executor;
pub mod version;

pub use client::{ContainerRecord, DockerClient, RunSpec, DEFAULT_TOOL};
pub use error::{DockerError, Result};
pub use executor::{
    CommandExecutor, CommandOutput, Invocation, ScriptedCommandExecutor, SystemCommandExecutor,
};
pub use version::DockerVersion;
