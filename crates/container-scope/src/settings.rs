use crate::env::BaselineEnvironment;
use crate::error::Result;
use crate::tool::resolve_executable;
use docker_cli::cgroup::DEFAULT_CGROUP_PATH;
use docker_cli::{DockerClient, DEFAULT_TOOL};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const TOOL_VAR: &str = "DOCKSTEP_DOCKER_TOOL";
pub const TMP_SUFFIX_VAR: &str = "DOCKSTEP_TMP_SUFFIX";
pub const CGROUP_PATH_VAR: &str = "DOCKSTEP_CGROUP_PATH";

/// Host-side knobs shared by every phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSettings {
    /// Engine executable name or path.
    pub tool: String,
    /// Separator between a workspace name and its `tmp` sibling.
    pub tmp_suffix: String,
    pub cgroup_path: PathBuf,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            tmp_suffix: "@".to_string(),
            cgroup_path: PathBuf::from(DEFAULT_CGROUP_PATH),
        }
    }
}

impl ScopeSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tool: non_empty_var(TOOL_VAR).unwrap_or(defaults.tool),
            tmp_suffix: non_empty_var(TMP_SUFFIX_VAR).unwrap_or(defaults.tmp_suffix),
            cgroup_path: non_empty_var(CGROUP_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.cgroup_path),
        }
    }

    /// Client for `tool`, looked up on the baseline `PATH` when it is a bare name.
    pub fn docker_client(&self, baseline: &BaselineEnvironment) -> Result<DockerClient> {
        let executable = resolve_executable(&self.tool, baseline)?;
        Ok(DockerClient::system(executable.to_string_lossy()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
