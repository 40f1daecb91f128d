use super::EngineArgs;
use anyhow::Result;
use clap::Args;
use container_scope::BaselineEnvironment;
use docker_cli::DockerVersion;

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Also report the container engine version
    #[arg(long)]
    pub engine: bool,

    #[command(flatten)]
    pub engine_args: EngineArgs,
}

pub fn run(args: VersionArgs) -> Result<()> {
    println!("{}", env!("CARGO_PKG_VERSION"));
    if !args.engine {
        return Ok(());
    }

    let docker = args
        .engine_args
        .settings()
        .docker_client(&BaselineEnvironment::capture())?;
    let minimum = DockerVersion::minimum_for_exec();
    match docker.version()? {
        Some(version) if version.is_older_than(&minimum) => {
            println!("engine {} (older than {}, exec unsupported)", version, minimum)
        }
        Some(version) => println!("engine {}", version),
        None => println!("engine unknown"),
    }
    Ok(())
}
