//! Runs the subprocesses of a build phase inside a container.
//!
//! A [`Provisioner`] starts the container, a [`ContainerScope`] rewrites every
//! launch of the phase into `docker exec`, and on abort the scope reaps the
//! processes the phase left running.

pub mod context;
pub mod decorator;
pub mod env;
pub mod error;
pub mod identity;
pub mod launch;
pub mod provision;
pub mod reaper;
pub mod scope;
pub mod settings;
pub mod tool;
pub mod volumes;

pub use context::{DecoratorContext, ScopeRecord, SCOPE_RECORD_VERSION};
pub use decorator::ContainerExecDecorator;
pub use env::{BaselineEnvironment, EnvVars};
pub use error::{Result, ScopeError};
pub use identity::{host_user, resolve_user};
pub use launch::{HostLauncher, LaunchChain, LaunchRequest, ProcessLauncher, RequestTransform};
pub use provision::{
    temp_dir_for, ContainerHandle, ContainerObserver, ProvisionRequest, Provisioner,
    TracingObserver,
};
pub use reaper::{Fingerprint, ProcessReaper};
pub use scope::ContainerScope;
pub use settings::ScopeSettings;
pub use volumes::VolumePlan;
