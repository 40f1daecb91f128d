use crate::env::{self, BaselineEnvironment, EnvVars};
use crate::error::{Result, ScopeError};
use crate::settings::ScopeSettings;
use crate::volumes::{self, VolumePlan};
use docker_cli::{CommandExecutor, ContainerRecord, DockerClient, DockerVersion, RunSpec};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Id of a container started for a phase. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub image: String,
    pub workspace: PathBuf,
    pub entrypoint: Option<String>,
    /// Command for the container, split on whitespace.
    pub command: Option<String>,
    /// Extra `run` arguments, split on whitespace.
    pub args: Option<String>,
    pub user: Option<String>,
    pub include_volumes: bool,
    pub include_environment: bool,
    /// Environment of the phase.
    pub environment: EnvVars,
    /// Environment of the host, subtracted from `environment`.
    pub host_environment: BaselineEnvironment,
}

/// Notified once a container is up, for fingerprinting and image bookkeeping.
pub trait ContainerObserver: Send + Sync {
    fn container_started(&self, image: &str, record: &ContainerRecord);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ContainerObserver for TracingObserver {
    fn container_started(&self, image: &str, record: &ContainerRecord) {
        info!(
            image,
            container = %record.id,
            name = %record.name,
            "container started"
        );
    }
}

/// `<workspace><suffix>tmp`, next to the workspace.
pub fn temp_dir_for(workspace: &Path, suffix: &str) -> PathBuf {
    match workspace.file_name() {
        Some(name) => {
            workspace.with_file_name(format!("{}{}tmp", name.to_string_lossy(), suffix))
        }
        None => PathBuf::from(format!("{}{}tmp", workspace.display(), suffix)),
    }
}

pub struct Provisioner<E> {
    docker: DockerClient<E>,
    settings: ScopeSettings,
    observer: Box<dyn ContainerObserver>,
}

impl<E: CommandExecutor> Provisioner<E> {
    pub fn new(docker: DockerClient<E>, settings: ScopeSettings) -> Self {
        Self {
            docker,
            settings,
            observer: Box::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: impl ContainerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn docker(&self) -> &DockerClient<E> {
        &self.docker
    }

    /// Rejects engines too old for `exec`. An unreadable version is only
    /// worth a warning.
    fn check_version(&self, request: &ProvisionRequest) -> Result<Option<DockerVersion>> {
        let version = self
            .docker
            .version()
            .map_err(|source| self.provisioning_error(request, source))?;
        let minimum = DockerVersion::minimum_for_exec();
        match &version {
            Some(found) if found.is_older_than(&minimum) => {
                return Err(ScopeError::Version {
                    found: found.clone(),
                    minimum,
                });
            }
            Some(found) => debug!(version = %found, "container engine version"),
            None => warn!(
                "Failed to parse the container engine version; the minimum supported version is {}",
                minimum
            ),
        }
        Ok(version)
    }

    pub fn provision(&self, request: &ProvisionRequest) -> Result<ContainerHandle> {
        self.check_version(request)?;

        let workspace = request.workspace.as_path();
        let temp_dir = temp_dir_for(workspace, &self.settings.tmp_suffix);
        for dir in [workspace, temp_dir.as_path()] {
            fs::create_dir_all(dir).map_err(|source| ScopeError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let workspace_str = workspace.to_string_lossy().into_owned();
        let plan = if request.include_volumes {
            self.plan_volumes(
                request,
                &[workspace_str.clone(), temp_dir.to_string_lossy().into_owned()],
            )?
        } else {
            VolumePlan::default()
        };

        let environment = if request.include_environment {
            let reduced = env::diff(&request.environment, &request.host_environment);
            debug!(variables = reduced.len(), "reduced environment");
            reduced
        } else {
            EnvVars::new()
        };

        let spec = RunSpec {
            image: request.image.clone(),
            workdir: Some(workspace_str),
            bind_mounts: plan.bind_mounts,
            volumes_from: plan.volumes_from,
            user: request.user.clone(),
            env: environment.into_pairs(),
            extra_args: split_words(request.args.as_deref()),
            entrypoint: request.entrypoint.clone(),
            command: split_words(request.command.as_deref()),
        };
        let id = self
            .docker
            .run(&spec)
            .map_err(|source| self.provisioning_error(request, source))?;

        let record = self.docker.container_record(&id).unwrap_or_else(|err| {
            warn!(container = %id, "failed to inspect started container: {}", err);
            ContainerRecord {
                id: id.clone(),
                image: request.image.clone(),
                name: String::new(),
            }
        });
        self.observer.container_started(&request.image, &record);

        Ok(ContainerHandle(id))
    }

    fn plan_volumes(&self, request: &ProvisionRequest, required: &[String]) -> Result<VolumePlan> {
        let self_container = self
            .docker
            .container_id_if_containerized(&self.settings.cgroup_path)
            .map_err(|source| self.provisioning_error(request, source))?;
        let mounted = match &self_container {
            Some(id) => self
                .docker
                .volumes(id)
                .map_err(|source| self.provisioning_error(request, source))?,
            None => Vec::new(),
        };
        Ok(volumes::plan(required, self_container.as_deref(), &mounted))
    }

    fn provisioning_error(
        &self,
        request: &ProvisionRequest,
        source: docker_cli::DockerError,
    ) -> ScopeError {
        ScopeError::Provisioning {
            image: request.image.clone(),
            source,
        }
    }
}

fn split_words(value: Option<&str>) -> Vec<String> {
    value
        .map(|text| text.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
