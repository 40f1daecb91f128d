use super::load_scope;
use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StopArgs {
    #[arg(long)]
    pub record: PathBuf,

    /// Delete the scope record once the container is gone
    #[arg(long)]
    pub forget: bool,
}

pub fn run(args: StopArgs) -> Result<()> {
    let scope = load_scope(&args.record)?;
    scope.stop()?;
    if args.forget {
        fs::remove_file(&args.record)
            .with_context(|| format!("Failed to remove {}", args.record.display()))?;
    }
    Ok(())
}
