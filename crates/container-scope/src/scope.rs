use crate::context::DecoratorContext;
use crate::decorator::ContainerExecDecorator;
use crate::error::{Result, ScopeError};
use crate::launch::{LaunchChain, ProcessLauncher};
use crate::reaper::{Fingerprint, ProcessReaper};
use docker_cli::{CommandExecutor, DockerClient, SystemCommandExecutor};
use std::sync::Arc;
use tracing::info;

/// A phase running inside one container. Hands out decorated launchers for
/// the phase and cleans up after it.
pub struct ContainerScope<E = SystemCommandExecutor> {
    decorator: Arc<ContainerExecDecorator>,
    executor: E,
}

impl ContainerScope<SystemCommandExecutor> {
    pub fn new(context: DecoratorContext) -> Self {
        Self::with_executor(context, SystemCommandExecutor)
    }
}

impl<E: CommandExecutor> ContainerScope<E> {
    pub fn with_executor(context: DecoratorContext, executor: E) -> Self {
        Self::from_decorator(
            Arc::new(ContainerExecDecorator::new(Arc::new(context))),
            executor,
        )
    }

    pub fn from_decorator(decorator: Arc<ContainerExecDecorator>, executor: E) -> Self {
        Self {
            decorator,
            executor,
        }
    }

    pub fn context(&self) -> &DecoratorContext {
        self.decorator.context()
    }

    pub fn decorator(&self) -> Arc<ContainerExecDecorator> {
        Arc::clone(&self.decorator)
    }

    /// `inner` wrapped so every launch runs in the container.
    pub fn launcher<L: ProcessLauncher>(&self, inner: L) -> LaunchChain<L> {
        self.decorate(LaunchChain::new(inner))
    }

    /// Appends the container rewrite to an existing chain.
    pub fn decorate<L: ProcessLauncher>(&self, chain: LaunchChain<L>) -> LaunchChain<L> {
        chain.with(self.decorator())
    }

    /// Client for the scope's engine, borrowing the scope's executor.
    pub fn docker(&self) -> Result<DockerClient<&E>> {
        let executable = self.decorator.executable()?;
        Ok(DockerClient::new(executable, &self.executor))
    }

    /// Kills what an aborted phase left behind. Returns the signalled pids.
    pub fn abort(&self, fingerprint: &Fingerprint) -> Result<Vec<u32>> {
        let docker = self.docker()?;
        let container = self.context().container_id();
        let pids = ProcessReaper::new(&docker).kill(container, fingerprint)?;
        if !pids.is_empty() {
            info!(container, ?pids, "killed leftover processes");
        }
        Ok(pids)
    }

    /// Force-removes the container.
    pub fn stop(&self) -> Result<()> {
        let docker = self.docker()?;
        let container = self.context().container_id();
        docker
            .remove(container)
            .map_err(|source| ScopeError::Engine {
                operation: "remove",
                container: container.to_string(),
                source,
            })?;
        info!(container, "container removed");
        Ok(())
    }
}
