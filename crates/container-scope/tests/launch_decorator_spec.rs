use anyhow::Result;
use container_scope::{
    ContainerExecDecorator, ContainerScope, DecoratorContext, EnvVars, LaunchChain,
    LaunchRequest, ProcessLauncher, RequestTransform, ScopeRecord,
};
use docker_cli::ScriptedCommandExecutor;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Stands in for the host launcher and keeps what it was asked to start.
#[derive(Default)]
struct RecordingLauncher(Mutex<Vec<LaunchRequest>>);

impl RecordingLauncher {
    fn seen(&self) -> Vec<LaunchRequest> {
        self.0.lock().unwrap().clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    type Outcome = i32;

    fn launch(&self, request: LaunchRequest) -> container_scope::Result<i32> {
        self.0.lock().unwrap().push(request);
        Ok(0)
    }
}

struct Nice;

impl RequestTransform for Nice {
    fn transform(&self, mut request: LaunchRequest) -> container_scope::Result<LaunchRequest> {
        request.argv.insert(0, "nice".to_string());
        if let Some(masks) = request.masks.as_mut() {
            masks.insert(0, false);
        }
        Ok(request)
    }
}

fn context() -> DecoratorContext {
    DecoratorContext::new(
        "c0ffee",
        "1000:1000",
        [("PATH", "/usr/bin"), ("HOME", "/home/ci")]
            .into_iter()
            .collect(),
        "/ws/j1",
        None,
    )
    .unwrap()
}

fn scope() -> ContainerScope<ScriptedCommandExecutor> {
    let decorator = ContainerExecDecorator::with_executable(Arc::new(context()), "/usr/bin/docker");
    ContainerScope::from_decorator(Arc::new(decorator), ScriptedCommandExecutor::new())
}

const PREFIX: [&str; 7] = [
    "/usr/bin/docker",
    "exec",
    "-t",
    "-u",
    "1000:1000",
    "c0ffee",
    "env",
];

#[test]
fn launch_runs_through_docker_exec() -> Result<()> {
    let scope = scope();
    let chain = scope.launcher(RecordingLauncher::default());

    let env: EnvVars = [("PATH", "/usr/bin"), ("MAVEN_OPTS", "-Xmx1g"), ("BUILD_ID", "7")]
        .into_iter()
        .collect();
    let outcome = chain.launch(
        LaunchRequest::new(["mvn", "-B", "verify"])
            .with_env(env.clone())
            .with_pwd("/ws/j1"),
    )?;
    assert_eq!(outcome, 0);

    let seen = chain.inner().seen();
    assert_eq!(seen.len(), 1);
    let mut expected: Vec<&str> = PREFIX.to_vec();
    expected.extend(["BUILD_ID=7", "MAVEN_OPTS=-Xmx1g", "mvn", "-B", "verify"]);
    assert_eq!(seen[0].argv, expected);
    assert_eq!(seen[0].env, env);
    Ok(())
}

#[test]
fn masks_follow_their_arguments() -> Result<()> {
    let scope = scope();
    let chain = scope.launcher(RecordingLauncher::default());

    let env: EnvVars = [("TOKEN_FILE", "/run/t")].into_iter().collect();
    chain.launch(
        LaunchRequest::new(["deploy", "--password", "hunter2"])
            .with_env(env)
            .with_masks(vec![false, false, true]),
    )?;

    let seen = chain.inner().seen();
    let request = &seen[0];
    let masks = request.masks.clone().unwrap();
    assert_eq!(masks.len(), request.argv.len());
    for (arg, secret) in request.argv.iter().zip(&masks) {
        assert_eq!(*secret, arg == "hunter2", "mask for {}", arg);
    }
    assert!(!request.display_command().contains("hunter2"));
    Ok(())
}

#[test]
fn transforms_added_later_wrap_the_exec_prefix() -> Result<()> {
    let scope = scope();
    let chain = scope.launcher(RecordingLauncher::default()).with(Arc::new(Nice));

    chain.launch(LaunchRequest::new(["make"]))?;

    let argv = chain.inner().seen()[0].argv.clone();
    assert_eq!(argv[0], "nice");
    assert_eq!(argv[1], "/usr/bin/docker");
    assert_eq!(argv.last().map(String::as_str), Some("make"));
    Ok(())
}

#[test]
fn concurrent_launches_do_not_interfere() -> Result<()> {
    let scope = scope();
    let chain = scope.launcher(RecordingLauncher::default());

    std::thread::scope(|threads| {
        for branch in 0..8 {
            let chain = &chain;
            threads.spawn(move || {
                let env: EnvVars = [("BRANCH", branch.to_string())].into_iter().collect();
                chain
                    .launch(LaunchRequest::new(["step".to_string(), branch.to_string()]).with_env(env))
                    .unwrap();
            });
        }
    });

    let seen = chain.inner().seen();
    assert_eq!(seen.len(), 8);
    for request in seen {
        assert_eq!(&request.argv[..7], PREFIX.as_slice());
        let branch = request.argv.last().unwrap();
        assert_eq!(request.argv[7], format!("BRANCH={}", branch));
        assert_eq!(request.argv.len(), 10);
    }
    Ok(())
}

#[test]
fn scope_record_resumes_the_same_rewrite() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("scope.json");
    context().to_record().with_image("maven:3").save(&path)?;

    let restored = DecoratorContext::from_record(ScopeRecord::load(&path)?)?;
    let decorator = ContainerExecDecorator::with_executable(Arc::new(restored), "/usr/bin/docker");
    let chain = LaunchChain::new(RecordingLauncher::default()).with(Arc::new(decorator));

    chain.launch(LaunchRequest::new(["true"]))?;
    let mut expected: Vec<&str> = PREFIX.to_vec();
    expected.push("true");
    assert_eq!(chain.inner().seen()[0].argv, expected);
    Ok(())
}

#[cfg(unix)]
#[test]
fn engine_path_from_the_context_is_used() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new()?;
    let engine = temp.path().join("podman");
    std::fs::write(&engine, "#!/bin/sh\nexit 0\n")?;
    std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755))?;

    let context = DecoratorContext::new(
        "c0ffee",
        "root",
        Default::default(),
        "/ws",
        Some(engine.to_string_lossy().into_owned()),
    )?;
    let scope = ContainerScope::with_executor(context, ScriptedCommandExecutor::new());
    let prefix = scope.decorator().prefix()?;
    assert_eq!(prefix[0], engine.to_string_lossy());
    Ok(())
}
