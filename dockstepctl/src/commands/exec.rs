use super::{load_scope, parse_assignment};
use anyhow::{Context, Result};
use clap::Args;
use container_scope::{EnvVars, HostLauncher, LaunchRequest, ProcessLauncher};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Scope record written by `run` or `inside`
    #[arg(long)]
    pub record: PathBuf,

    /// Working directory of the launch (default: current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Extra variable for the launch, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub env: Vec<(String, String)>,

    /// Command to run in the container
    #[arg(last = true, required = true, value_name = "ARGV")]
    pub argv: Vec<String>,
}

/// Returns the exit code of the launched process.
pub fn run(args: ExecArgs) -> Result<i32> {
    let scope = load_scope(&args.record)?;

    let mut env = EnvVars::from_process();
    for (key, value) in args.env {
        env.set(key, value);
    }
    let pwd = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let launcher = scope.launcher(HostLauncher);
    let status = launcher.launch(LaunchRequest::new(args.argv).with_env(env).with_pwd(pwd))?;
    Ok(status.code().unwrap_or(1))
}
