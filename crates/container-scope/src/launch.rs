use crate::env::EnvVars;
use crate::error::{Result, ScopeError};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use tracing::info;

const MASK: &str = "********";

/// One subprocess a phase wants to start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    pub argv: Vec<String>,
    pub env: EnvVars,
    pub pwd: Option<PathBuf>,
    /// Per-argument secrecy flags aligned with `argv`.
    pub masks: Option<Vec<bool>>,
}

impl LaunchRequest {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_env(mut self, env: EnvVars) -> Self {
        self.env = env;
        self
    }

    pub fn with_pwd(mut self, pwd: impl Into<PathBuf>) -> Self {
        self.pwd = Some(pwd.into());
        self
    }

    pub fn with_masks(mut self, masks: Vec<bool>) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Command line for logs, secret arguments replaced.
    pub fn display_command(&self) -> String {
        self.argv
            .iter()
            .enumerate()
            .map(|(idx, arg)| {
                let secret = self
                    .masks
                    .as_ref()
                    .and_then(|masks| masks.get(idx).copied())
                    .unwrap_or(false);
                if secret {
                    MASK.to_string()
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Starts processes described by [`LaunchRequest`]s.
pub trait ProcessLauncher: Send + Sync {
    type Outcome;

    fn launch(&self, request: LaunchRequest) -> Result<Self::Outcome>;
}

/// Rewrites a request before it reaches the launcher.
pub trait RequestTransform: Send + Sync {
    fn transform(&self, request: LaunchRequest) -> Result<LaunchRequest>;
}

/// A launcher preceded by an ordered list of transforms. Transforms run in
/// the order they were added; the last one hands its output to `inner`.
pub struct LaunchChain<L> {
    transforms: Vec<Arc<dyn RequestTransform>>,
    inner: L,
}

impl<L: ProcessLauncher> LaunchChain<L> {
    pub fn new(inner: L) -> Self {
        Self {
            transforms: Vec::new(),
            inner,
        }
    }

    pub fn with(mut self, transform: Arc<dyn RequestTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Applies every transform without launching anything.
    pub fn prepare(&self, request: LaunchRequest) -> Result<LaunchRequest> {
        self.transforms
            .iter()
            .try_fold(request, |request, transform| transform.transform(request))
    }
}

impl<L: ProcessLauncher> ProcessLauncher for LaunchChain<L> {
    type Outcome = L::Outcome;

    fn launch(&self, request: LaunchRequest) -> Result<Self::Outcome> {
        let request = self.prepare(request)?;
        self.inner.launch(request)
    }
}

/// Runs the request on this host with inherited stdio and waits for it.
/// The request environment is layered over the current process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLauncher;

impl ProcessLauncher for HostLauncher {
    type Outcome = ExitStatus;

    fn launch(&self, request: LaunchRequest) -> Result<ExitStatus> {
        let (program, args) = request.argv.split_first().ok_or(ScopeError::EmptyCommand)?;
        info!("$ {}", request.display_command());

        let mut command = Command::new(program);
        command.args(args);
        command.envs(request.env.iter());
        if let Some(pwd) = &request.pwd {
            command.current_dir(pwd);
        }
        command.status().map_err(|source| ScopeError::Launch {
            program: program.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<LaunchRequest>>);

    impl ProcessLauncher for Recorder {
        type Outcome = usize;

        fn launch(&self, request: LaunchRequest) -> Result<usize> {
            let mut seen = self.0.lock().unwrap();
            seen.push(request);
            Ok(seen.len())
        }
    }

    struct Prepend(&'static str);

    impl RequestTransform for Prepend {
        fn transform(&self, mut request: LaunchRequest) -> Result<LaunchRequest> {
            request.argv.insert(0, self.0.to_string());
            Ok(request)
        }
    }

    #[test]
    fn transforms_apply_in_insertion_order() {
        let chain = LaunchChain::new(Recorder(Mutex::new(Vec::new())))
            .with(Arc::new(Prepend("inner")))
            .with(Arc::new(Prepend("outer")));

        let outcome = chain.launch(LaunchRequest::new(["make"])).unwrap();
        assert_eq!(outcome, 1);

        let seen = chain.inner().0.lock().unwrap();
        assert_eq!(seen[0].argv, vec!["outer", "inner", "make"]);
    }

    #[test]
    fn display_command_hides_masked_arguments() {
        let request = LaunchRequest::new(["curl", "-u", "admin:s3cret"])
            .with_masks(vec![false, false, true]);
        assert_eq!(request.display_command(), "curl -u ********");
    }

    #[test]
    fn host_launcher_rejects_empty_argv() {
        let err = HostLauncher.launch(LaunchRequest::default()).unwrap_err();
        assert!(matches!(err, ScopeError::EmptyCommand));
    }

    #[cfg(unix)]
    #[test]
    fn host_launcher_passes_environment_and_reports_status() {
        let mut env = EnvVars::new();
        env.set("DOCKSTEP_PROBE", "7");
        let request = LaunchRequest::new(["/bin/sh", "-c", "test \"$DOCKSTEP_PROBE\" = 7"])
            .with_env(env);
        let status = HostLauncher.launch(request).unwrap();
        assert!(status.success());
    }
}
