use super::{parse_assignment, EngineArgs};
use anyhow::{Context, Result};
use clap::Args;
use container_scope::{
    host_user, resolve_user, BaselineEnvironment, DecoratorContext, EnvVars, ProvisionRequest,
    Provisioner,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image to start
    #[arg(long)]
    pub image: String,

    /// Workspace directory shared with the container
    #[arg(long)]
    pub workspace: PathBuf,

    /// User to run as (default: uid:gid of this process)
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub entrypoint: Option<String>,

    /// Container command, split on whitespace
    #[arg(long, allow_hyphen_values = true)]
    pub command: Option<String>,

    /// Extra `run` arguments, split on whitespace
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Share the workspace through mounts
    #[arg(long)]
    pub include_volumes: bool,

    /// Pass phase-specific variables to the container
    #[arg(long)]
    pub include_environment: bool,

    /// Phase variable, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub env: Vec<(String, String)>,

    /// Write a scope record for later `exec`, `kill` and `stop`
    #[arg(long)]
    pub record: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub fn run(args: RunArgs) -> Result<()> {
    let baseline = BaselineEnvironment::capture();
    let settings = args.engine.settings();
    let docker = settings.docker_client(&baseline)?;

    let mut environment = EnvVars::from_process();
    for (key, value) in &args.env {
        environment.set(key.as_str(), value.as_str());
    }

    let request = ProvisionRequest {
        image: args.image.clone(),
        workspace: args.workspace.clone(),
        entrypoint: args.entrypoint,
        command: args.command,
        args: args.args,
        user: args.user.clone().or_else(host_user),
        include_volumes: args.include_volumes,
        include_environment: args.include_environment,
        environment,
        host_environment: baseline.clone(),
    };
    let provisioner = Provisioner::new(docker, settings.clone());
    let handle = provisioner
        .provision(&request)
        .with_context(|| format!("Failed to start {}", args.image))?;

    if let Some(path) = &args.record {
        let user = match request.user {
            Some(user) => user,
            None => resolve_user(None, provisioner.docker(), handle.as_str())?,
        };
        let context = DecoratorContext::new(
            handle.as_str(),
            user,
            baseline,
            &args.workspace,
            Some(settings.tool.clone()),
        )?;
        context
            .to_record()
            .with_image(&args.image)
            .save(path)
            .with_context(|| format!("Failed to write scope record {}", path.display()))?;
    }

    println!("{}", handle);
    Ok(())
}
