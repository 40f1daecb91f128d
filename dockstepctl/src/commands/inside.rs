use super::EngineArgs;
use anyhow::{Context, Result};
use clap::Args;
use container_scope::{resolve_user, BaselineEnvironment, DecoratorContext};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct InsideArgs {
    /// Id or name of the running container
    #[arg(long)]
    pub container: String,

    /// Workspace directory as seen by the container
    #[arg(long)]
    pub workspace: PathBuf,

    /// User for decorated launches (default: uid:gid of this process)
    #[arg(long)]
    pub user: Option<String>,

    /// Where to write the scope record; printed to stdout when omitted
    #[arg(long)]
    pub record: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub fn run(args: InsideArgs) -> Result<()> {
    let baseline = BaselineEnvironment::capture();
    let settings = args.engine.settings();
    let docker = settings.docker_client(&baseline)?;
    let user = resolve_user(args.user.as_deref(), &docker, &args.container)?;

    let context = DecoratorContext::new(
        args.container,
        user,
        baseline,
        args.workspace,
        Some(settings.tool),
    )?;
    let record = context.to_record();

    match &args.record {
        Some(path) => {
            record
                .save(path)
                .with_context(|| format!("Failed to write scope record {}", path.display()))?;
            info!(
                container = context.container_id(),
                user = context.user(),
                "scope recorded at {}",
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}
