pub mod exec;
pub mod inside;
pub mod kill;
pub mod run;
pub mod stop;
pub mod version;

use anyhow::{Context, Result};
use clap::Args;
use container_scope::{ContainerScope, DecoratorContext, ScopeRecord, ScopeSettings};
use std::path::{Path, PathBuf};

/// Engine knobs shared by commands that talk to the engine directly. Unset
/// flags fall back to the `DOCKSTEP_*` environment, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Container engine executable name or path [env: DOCKSTEP_DOCKER_TOOL] [default: docker]
    #[arg(long = "docker")]
    pub tool: Option<String>,

    /// Separator between the workspace name and its temporary sibling [env: DOCKSTEP_TMP_SUFFIX] [default: @]
    #[arg(long)]
    pub tmp_suffix: Option<String>,

    /// cgroup file used to detect whether this process runs in a container [env: DOCKSTEP_CGROUP_PATH]
    #[arg(long)]
    pub cgroup_path: Option<PathBuf>,
}

impl EngineArgs {
    pub fn settings(&self) -> ScopeSettings {
        let mut settings = ScopeSettings::from_env();
        if let Some(tool) = &self.tool {
            settings.tool = tool.clone();
        }
        if let Some(suffix) = &self.tmp_suffix {
            settings.tmp_suffix = suffix.clone();
        }
        if let Some(path) = &self.cgroup_path {
            settings.cgroup_path = path.clone();
        }
        settings
    }
}

/// Parses `KEY=VALUE`. The value may be empty; the key may not.
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

pub fn load_scope(record: &Path) -> Result<ContainerScope> {
    let record = ScopeRecord::load(record)
        .with_context(|| format!("Failed to load scope record {}", record.display()))?;
    let context = DecoratorContext::from_record(record)?;
    Ok(ContainerScope::new(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("OPTS=-Dx=y").unwrap(),
            ("OPTS".to_string(), "-Dx=y".to_string())
        );
        assert_eq!(
            parse_assignment("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
    }

    #[test]
    fn assignment_requires_a_key() {
        assert!(parse_assignment("=oops").is_err());
        assert!(parse_assignment("NOEQUALS").is_err());
    }

    #[test]
    fn flags_override_settings() {
        let args = EngineArgs {
            tool: Some("/opt/podman/bin/podman".to_string()),
            tmp_suffix: Some("__".to_string()),
            cgroup_path: Some(PathBuf::from("/tmp/cgroup")),
        };
        let settings = args.settings();
        assert_eq!(settings.tool, "/opt/podman/bin/podman");
        assert_eq!(settings.tmp_suffix, "__");
        assert_eq!(settings.cgroup_path, PathBuf::from("/tmp/cgroup"));
    }
}
