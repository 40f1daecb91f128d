use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "dockstepctl", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a detached container for a build phase
    Run(commands::run::RunArgs),
    /// Record a scope for a container that is already running
    Inside(commands::inside::InsideArgs),
    /// Run a command inside the scope's container
    Exec(commands::exec::ExecArgs),
    /// Kill the scope's processes matching a fingerprint
    Kill(commands::kill::KillArgs),
    /// Force-remove the scope's container
    Stop(commands::stop::StopArgs),
    /// Print version and exit
    Version(commands::version::VersionArgs),
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run(args) => commands::run::run(args)?,
        Commands::Inside(args) => commands::inside::run(args)?,
        Commands::Exec(args) => {
            let code = commands::exec::run(args)?;
            std::process::exit(code);
        }
        Commands::Kill(args) => commands::kill::run(args)?,
        Commands::Stop(args) => commands::stop::run(args)?,
        Commands::Version(args) => commands::version::run(args)?,
    }
    Ok(())
}
