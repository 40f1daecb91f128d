use super::{load_scope, parse_assignment};
use anyhow::Result;
use clap::Args;
use container_scope::Fingerprint;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct KillArgs {
    #[arg(long)]
    pub record: PathBuf,

    /// Variable every target process carries in its environment, repeatable
    #[arg(
        long = "match",
        value_name = "KEY=VALUE",
        required = true,
        value_parser = parse_assignment
    )]
    pub matches: Vec<(String, String)>,
}

pub fn run(args: KillArgs) -> Result<()> {
    let scope = load_scope(&args.record)?;
    let fingerprint: Fingerprint = args.matches.into_iter().collect();

    let pids = scope.abort(&fingerprint)?;
    for pid in pids {
        println!("{}", pid);
    }
    Ok(())
}
