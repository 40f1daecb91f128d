use crate::error::{Result, ScopeError};
use docker_cli::{CommandExecutor, DockerClient};
use std::collections::BTreeMap;
use tracing::debug;

/// Variables that identify the processes of one invocation. A process is
/// matched when every `KEY=VALUE` shows up in its `ps` line.
pub type Fingerprint = BTreeMap<String, String>;

/// Kills the processes an aborted invocation left running in a container.
pub struct ProcessReaper<'a, E> {
    docker: &'a DockerClient<E>,
}

impl<'a, E: CommandExecutor> ProcessReaper<'a, E> {
    pub fn new(docker: &'a DockerClient<E>) -> Self {
        Self { docker }
    }

    /// Returns the pids that were signalled, in `ps` order.
    pub fn kill(&self, container: &str, fingerprint: &Fingerprint) -> Result<Vec<u32>> {
        let listing = self
            .docker
            .exec(container, &["ps", "-A", "-o", "pid,command", "e"])
            .map_err(|err| reap_error("ps", container, err.to_string()))?;
        if !listing.success() {
            return Err(reap_error(
                "ps",
                container,
                format!("exit status {}: {}", listing.status, listing.stderr.trim()),
            ));
        }

        let pids = select_pids(&listing.stdout, fingerprint);
        debug!(?pids, container, "killing");
        if pids.is_empty() {
            return Ok(pids);
        }

        let pid_args: Vec<String> = pids.iter().map(u32::to_string).collect();
        let mut command = vec!["kill"];
        command.extend(pid_args.iter().map(String::as_str));
        let output = self
            .docker
            .exec(container, &command)
            .map_err(|err| reap_error("kill", container, err.to_string()))?;
        if !output.success() {
            return Err(reap_error(
                "kill",
                container,
                format!("exit status {}: {}", output.status, output.stderr.trim()),
            ));
        }
        Ok(pids)
    }
}

/// Pids of `ps -o pid,command e` lines containing every fingerprint pair.
///
/// The match is a raw substring test over the whole line, so an argument that
/// happens to read `KEY=VALUE` matches as well as a real environment entry.
pub fn select_pids(listing: &str, fingerprint: &Fingerprint) -> Vec<u32> {
    listing
        .split('\n')
        .filter(|line| {
            fingerprint
                .iter()
                .all(|(key, value)| line.contains(&format!("{}={}", key, value)))
        })
        .filter_map(|line| {
            let (pid, _command) = line.trim().split_once(char::is_whitespace)?;
            pid.parse::<u32>().ok()
        })
        .collect()
}

fn reap_error(operation: &'static str, container: &str, message: String) -> ScopeError {
    ScopeError::Reap {
        operation,
        container: container.to_string(),
        message,
    }
}
