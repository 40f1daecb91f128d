use crate::env::BaselineEnvironment;
use crate::error::{Result, ScopeError};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates the engine executable. A name containing a path separator is used
/// as given; a bare name is searched on the baseline `PATH`.
pub fn resolve_executable(tool: &str, baseline: &BaselineEnvironment) -> Result<PathBuf> {
    if tool.contains(std::path::MAIN_SEPARATOR) || tool.contains('/') {
        let path = Path::new(tool);
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ScopeError::ExecutableResolution {
            tool: tool.to_string(),
            message: "no such file".to_string(),
        });
    }

    let cwd = search_root(env::current_dir(), baseline);
    which::which_in(tool, baseline.get("PATH"), cwd).map_err(|err| {
        ScopeError::ExecutableResolution {
            tool: tool.to_string(),
            message: err.to_string(),
        }
    })
}

/// Directory relative `PATH` entries are resolved against. Falls back to the
/// baseline `PWD` when the working directory is gone, then to `/`.
fn search_root(current: io::Result<PathBuf>, baseline: &BaselineEnvironment) -> PathBuf {
    match current {
        Ok(dir) => dir,
        Err(err) => {
            let fallback = baseline
                .get("PWD")
                .filter(|pwd| !pwd.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/"));
            debug!(
                error = %err,
                fallback = %fallback.display(),
                "Working directory unavailable for executable lookup"
            );
            fallback
        }
    }
}
