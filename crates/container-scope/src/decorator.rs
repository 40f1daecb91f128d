use crate::context::DecoratorContext;
use crate::env;
use crate::error::{Result, ScopeError};
use crate::launch::{LaunchRequest, RequestTransform};
use crate::tool::resolve_executable;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rewrites launch requests so they run inside the phase's container through
/// `<engine> exec -t -u <user> <container> env KEY=VALUE... argv...`.
pub struct ContainerExecDecorator {
    context: Arc<DecoratorContext>,
    executable: OnceCell<String>,
}

impl ContainerExecDecorator {
    /// The engine executable is resolved on first use and then reused.
    pub fn new(context: Arc<DecoratorContext>) -> Self {
        Self {
            context,
            executable: OnceCell::new(),
        }
    }

    pub fn with_executable(context: Arc<DecoratorContext>, executable: impl Into<String>) -> Self {
        Self {
            context,
            executable: OnceCell::with_value(executable.into()),
        }
    }

    pub fn context(&self) -> &DecoratorContext {
        &self.context
    }

    pub fn executable(&self) -> Result<&str> {
        self.executable
            .get_or_try_init(|| {
                let path = resolve_executable(self.context.tool(), self.context.baseline())?;
                debug!(executable = %path.display(), "resolved container engine");
                Ok::<_, ScopeError>(path.to_string_lossy().into_owned())
            })
            .map(String::as_str)
    }

    /// `[executable, "exec", "-t", "-u", user, container, "env"]`
    pub fn prefix(&self) -> Result<Vec<String>> {
        let ctx = &self.context;
        Ok(vec![
            self.executable()?.to_string(),
            "exec".to_string(),
            "-t".to_string(),
            "-u".to_string(),
            ctx.user().to_string(),
            ctx.container_id().to_string(),
            "env".to_string(),
        ])
    }

    pub fn rewrite(&self, request: LaunchRequest) -> Result<LaunchRequest> {
        let mut argv = self.prefix()?;

        if let Some(pwd) = &request.pwd {
            if pwd.as_path() != self.context.workspace() {
                warn!(
                    "working directory will be {} not {}",
                    self.context.workspace().display(),
                    pwd.display()
                );
            }
        }

        let reduced = env::diff(&request.env, self.context.baseline());
        argv.extend(reduced.to_sorted_tokens());

        let inserted = argv.len();
        let masks = request.masks.map(|original| {
            let mut masks = vec![false; inserted];
            masks.extend(original);
            masks
        });
        argv.extend(request.argv);

        Ok(LaunchRequest {
            argv,
            env: request.env,
            pwd: request.pwd,
            masks,
        })
    }
}

impl RequestTransform for ContainerExecDecorator {
    fn transform(&self, request: LaunchRequest) -> Result<LaunchRequest> {
        self.rewrite(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{BaselineEnvironment, EnvVars};

    fn decorator() -> ContainerExecDecorator {
        let baseline: BaselineEnvironment =
            [("PATH", "/usr/bin"), ("BUILD_ID", "1")].into_iter().collect();
        let context =
            DecoratorContext::new("abc123", "1000:1000", baseline, "/ws/j1", None).unwrap();
        ContainerExecDecorator::with_executable(Arc::new(context), "/usr/bin/docker")
    }

    #[test]
    fn rewrite_prefixes_exec_and_reduced_environment() {
        let env: EnvVars = [
            ("PATH", "/usr/bin"),
            ("ZED", "z"),
            ("BUILD_ID", "1"),
            ("FOO", "bar"),
        ]
        .into_iter()
        .collect();
        let request = LaunchRequest::new(["mvn", "-B", "verify"]).with_env(env);

        let rewritten = decorator().rewrite(request).unwrap();
        assert_eq!(
            rewritten.argv,
            vec![
                "/usr/bin/docker",
                "exec",
                "-t",
                "-u",
                "1000:1000",
                "abc123",
                "env",
                "FOO=bar",
                "ZED=z",
                "mvn",
                "-B",
                "verify"
            ]
        );
        assert_eq!(rewritten.masks, None);
    }

    #[test]
    fn masks_shift_by_inserted_arguments() {
        let env: EnvVars = [("FOO", "bar")].into_iter().collect();
        let request = LaunchRequest::new(["login", "-p", "s3cret"])
            .with_env(env)
            .with_masks(vec![false, false, true]);

        let rewritten = decorator().rewrite(request).unwrap();
        let masks = rewritten.masks.unwrap();
        assert_eq!(masks.len(), rewritten.argv.len());
        assert_eq!(masks.len(), 3 + 7 + 1);
        assert!(masks[..8].iter().all(|secret| !secret));
        assert_eq!(&masks[8..], &[false, false, true]);
    }

    #[test]
    fn working_directory_mismatch_is_not_fatal() {
        let request = LaunchRequest::new(["ls"]).with_pwd("/elsewhere");
        let rewritten = decorator().rewrite(request).unwrap();
        assert_eq!(rewritten.pwd.as_deref(), Some(std::path::Path::new("/elsewhere")));
        assert_eq!(rewritten.argv.last().map(String::as_str), Some("ls"));
    }

    #[test]
    fn unresolvable_engine_fails_the_launch() {
        let context = DecoratorContext::new(
            "abc123",
            "root",
            [("PATH", "/nonexistent")].into_iter().collect(),
            "/ws",
            Some("dockstep-missing-engine".to_string()),
        )
        .unwrap();
        let decorator = ContainerExecDecorator::new(Arc::new(context));
        let err = decorator.rewrite(LaunchRequest::new(["true"])).unwrap_err();
        assert!(matches!(err, ScopeError::ExecutableResolution { .. }));
    }
}
