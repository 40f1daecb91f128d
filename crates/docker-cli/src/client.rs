use crate::cgroup;
use crate::error::{DockerError, Result};
use crate::executor::{CommandExecutor, CommandOutput, SystemCommandExecutor};
use crate::version::DockerVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_TOOL: &str = "docker";

const MASK: &str = "********";

/// Arguments for `docker run -d`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub workdir: Option<String>,
    /// Host path to container path, in declaration order.
    pub bind_mounts: Vec<(String, String)>,
    pub volumes_from: Vec<String>,
    pub user: Option<String>,
    pub env: Vec<(String, String)>,
    pub extra_args: Vec<String>,
    pub entrypoint: Option<String>,
    pub command: Vec<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), "-d".to_string()];
        if let Some(workdir) = &self.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        for (host, container) in &self.bind_mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}", host, container));
        }
        for container in &self.volumes_from {
            args.push("--volumes-from".to_string());
            args.push(container.clone());
        }
        if let Some(user) = &self.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.extend(self.extra_args.iter().cloned());
        if let Some(entrypoint) = &self.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// What `docker inspect` reports about a started container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    pub name: String,
}

/// Thin wrapper over the container engine's command line.
pub struct DockerClient<E = SystemCommandExecutor> {
    executable: String,
    executor: E,
}

impl DockerClient<SystemCommandExecutor> {
    pub fn system(executable: impl Into<String>) -> Self {
        Self::new(executable, SystemCommandExecutor)
    }
}

impl<E: CommandExecutor> DockerClient<E> {
    pub fn new(executable: impl Into<String>, executor: E) -> Self {
        Self {
            executable: executable.into(),
            executor,
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Client version as reported by the engine. `None` when the output
    /// cannot be parsed; the caller decides whether that matters.
    ///
    /// Engines before 1.8 reject `--format`, so a failed or unreadable
    /// formatted call falls back to plain `version`, and then to whatever
    /// either call printed on stderr.
    pub fn version(&self) -> Result<Option<DockerVersion>> {
        let formatted = self.invoke(strings(&["version", "--format", "{{.Client.Version}}"]))?;
        if formatted.success() {
            if let Some(version) = DockerVersion::parse(&formatted.stdout) {
                return Ok(Some(version));
            }
        } else {
            warn!(
                status = formatted.status,
                stderr = %formatted.stderr.trim(),
                "{} version --format exited unsuccessfully",
                self.executable
            );
        }

        let plain = self.invoke(strings(&["version"]))?;
        Ok(DockerVersion::parse(&plain.stdout)
            .or_else(|| DockerVersion::parse(&formatted.stderr))
            .or_else(|| DockerVersion::parse(&plain.stderr)))
    }

    /// Starts a detached container and returns its id.
    pub fn run(&self, spec: &RunSpec) -> Result<String> {
        let args = spec.to_args();
        let output = self.invoke_checked(args.clone())?;
        let id = output.stdout.trim();
        if id.is_empty() {
            return Err(DockerError::MissingContainerId {
                command: self.describe(&args),
            });
        }
        // `run` may print pull progress before the id
        let id = id.lines().last().unwrap_or(id).trim().to_string();
        Ok(id)
    }

    /// Mount destinations of a container.
    pub fn volumes(&self, container: &str) -> Result<Vec<String>> {
        let output = self.invoke_checked(strings(&[
            "inspect",
            "-f",
            "{{range .Mounts}}{{.Destination}}\n{{end}}",
            container,
        ]))?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Runs a command inside a container. The exit status is left to the caller.
    pub fn exec(&self, container: &str, command: &[&str]) -> Result<CommandOutput> {
        let mut args = strings(&["exec", container]);
        args.extend(command.iter().map(|part| part.to_string()));
        self.invoke(args)
    }

    /// Default user of a running container.
    pub fn whoami(&self, container: &str) -> Result<String> {
        let args = strings(&["exec", container, "whoami"]);
        let output = self.invoke_checked(args.clone())?;
        let user = output.stdout.trim();
        if user.is_empty() {
            return Err(DockerError::UnexpectedOutput {
                command: self.describe(&args),
                output: output.stdout,
            });
        }
        Ok(user.to_string())
    }

    pub fn container_record(&self, container: &str) -> Result<ContainerRecord> {
        let args = strings(&[
            "inspect",
            "-f",
            "{{.Id}} {{.Config.Image}} {{.Name}}",
            container,
        ]);
        let output = self.invoke_checked(args.clone())?;
        let mut fields = output.stdout.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(image), Some(name)) => Ok(ContainerRecord {
                id: id.to_string(),
                image: image.to_string(),
                name: name.trim_start_matches('/').to_string(),
            }),
            _ => Err(DockerError::UnexpectedOutput {
                command: self.describe(&args),
                output: output.stdout,
            }),
        }
    }

    pub fn remove(&self, container: &str) -> Result<()> {
        self.invoke_checked(strings(&["rm", "-f", container]))?;
        Ok(())
    }

    /// Id of the container this process runs in, if any.
    pub fn container_id_if_containerized(&self, cgroup_path: &Path) -> Result<Option<String>> {
        cgroup::read_container_id(cgroup_path)
    }

    fn invoke(&self, args: Vec<String>) -> Result<CommandOutput> {
        debug!(command = %self.describe(&args), "invoking container engine");
        self.executor
            .execute(&self.executable, &args)
            .map_err(|source| DockerError::Spawn {
                command: self.describe(&args),
                source,
            })
    }

    fn invoke_checked(&self, args: Vec<String>) -> Result<CommandOutput> {
        let output = self.invoke(args.clone())?;
        if !output.success() {
            return Err(DockerError::CommandFailed {
                command: self.describe(&args),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Command line for logs and errors, with `-e` values masked.
    fn describe(&self, args: &[String]) -> String {
        let mut parts = vec![self.executable.clone()];
        let mut mask_next = false;
        for arg in args {
            if mask_next {
                let key = arg.split('=').next().unwrap_or_default();
                parts.push(format!("{}={}", key, MASK));
            } else {
                parts.push(arg.clone());
            }
            mask_next = arg == "-e";
        }
        parts.join(" ")
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
