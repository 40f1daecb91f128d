use crate::error::{Result, ScopeError};
use docker_cli::{CommandExecutor, DockerClient};
use std::env;

pub const USER_OVERRIDE_VAR: &str = "DOCKSTEP_CONTAINER_USER";

/// `uid:gid` of this process, so files written in the shared workspace stay
/// owned by the host user.
pub fn host_user() -> Option<String> {
    if let Ok(value) = env::var(USER_OVERRIDE_VAR) {
        if !value.trim().is_empty() {
            return Some(value.trim().to_string());
        }
    }
    #[cfg(unix)]
    {
        let uid = unsafe { libc::geteuid() };
        let gid = unsafe { libc::getegid() };
        Some(format!("{}:{}", uid, gid))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Explicit user first, then the host identity, then whatever the container
/// runs as by default.
pub fn resolve_user<E: CommandExecutor>(
    explicit: Option<&str>,
    docker: &DockerClient<E>,
    container: &str,
) -> Result<String> {
    if let Some(user) = explicit.filter(|user| !user.trim().is_empty()) {
        return Ok(user.to_string());
    }
    if let Some(user) = host_user() {
        return Ok(user);
    }
    docker
        .whoami(container)
        .map_err(|source| ScopeError::Identity {
            container: container.to_string(),
            source,
        })
}
