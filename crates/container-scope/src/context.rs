use crate::env::BaselineEnvironment;
use crate::error::{Result, ScopeError};
use chrono::{DateTime, Utc};
use docker_cli::DEFAULT_TOOL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCOPE_RECORD_VERSION: u32 = 1;

/// Everything a decorated launch needs to know about its phase. Built once
/// when the phase starts and shared read-only by every launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorContext {
    container_id: String,
    user: String,
    baseline: BaselineEnvironment,
    workspace: PathBuf,
    tool_name: Option<String>,
}

impl DecoratorContext {
    pub fn new(
        container_id: impl Into<String>,
        user: impl Into<String>,
        baseline: BaselineEnvironment,
        workspace: impl Into<PathBuf>,
        tool_name: Option<String>,
    ) -> Result<Self> {
        let container_id = container_id.into();
        if container_id.trim().is_empty() {
            return Err(ScopeError::Record {
                message: "container id cannot be empty".to_string(),
            });
        }
        let user = user.into();
        if user.trim().is_empty() {
            return Err(ScopeError::Record {
                message: "user cannot be empty".to_string(),
            });
        }
        Ok(Self {
            container_id,
            user,
            baseline,
            workspace: workspace.into(),
            tool_name: tool_name.filter(|name| !name.trim().is_empty()),
        })
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn baseline(&self) -> &BaselineEnvironment {
        &self.baseline
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    /// Engine tool to resolve, falling back to `docker`.
    pub fn tool(&self) -> &str {
        self.tool_name().unwrap_or(DEFAULT_TOOL)
    }

    pub fn to_record(&self) -> ScopeRecord {
        ScopeRecord {
            version: SCOPE_RECORD_VERSION,
            container_id: self.container_id.clone(),
            user: self.user.clone(),
            baseline_environment: self.baseline.clone(),
            workspace: self.workspace.clone(),
            tool_name: self.tool_name.clone(),
            image: None,
            created_at: Utc::now(),
        }
    }

    pub fn from_record(record: ScopeRecord) -> Result<Self> {
        if record.version != SCOPE_RECORD_VERSION {
            return Err(ScopeError::Record {
                message: format!(
                    "unsupported record version {} (expected {})",
                    record.version, SCOPE_RECORD_VERSION
                ),
            });
        }
        Self::new(
            record.container_id,
            record.user,
            record.baseline_environment,
            record.workspace,
            record.tool_name,
        )
    }
}

/// Persisted form of a [`DecoratorContext`], so a phase can be resumed by a
/// later process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRecord {
    pub version: u32,
    pub container_id: String,
    pub user: String,
    pub baseline_environment: BaselineEnvironment,
    pub workspace: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScopeRecord {
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|err| ScopeError::Record {
            message: format!("failed to serialize: {}", err),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ScopeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, bytes).map_err(|source| ScopeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|source| ScopeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|err| ScopeError::Record {
            message: format!("failed to parse {}: {}", path.display(), err),
        })
    }
}
