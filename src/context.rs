//! Project context resolution for voxdeploy.
//!
//! Finds the project root (the nearest ancestor directory holding
//! `deploy.yaml`) from any working directory, loads the configuration and
//! resolves the store, unit and state directories against the root.
//!
//! Every command except `init` goes through this module, so builds and
//! compiles always target the same store regardless of where the command
//! is invoked from.

use crate::config::{CONFIG_FILE, DeployConfig};
use crate::error::{Result, VoxError};
use std::env;
use std::path::{Path, PathBuf};

/// Resolved project paths and configuration. All paths are absolute.
#[derive(Debug, Clone)]
pub struct DeployContext {
    /// Directory containing `deploy.yaml`.
    pub project_root: PathBuf,

    pub config: DeployConfig,

    /// Content-addressed artifact store.
    pub store_dir: PathBuf,

    /// Rendered unit files.
    pub unit_dir: PathBuf,

    /// Event log directory.
    pub state_dir: PathBuf,
}

impl DeployContext {
    /// Resolve the context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            VoxError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the context from a specific directory.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let project_root = find_project_root(cwd.as_ref())?;
        let config = DeployConfig::load(project_root.join(CONFIG_FILE))?;

        Ok(Self {
            store_dir: project_root.join(&config.store_dir),
            unit_dir: project_root.join(&config.unit_dir),
            state_dir: project_root.join(&config.state_dir),
            project_root,
            config,
        })
    }

    /// Path to `deploy.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(CONFIG_FILE)
    }

    /// Path to the append-only event log.
    pub fn events_file(&self) -> PathBuf {
        self.state_dir.join("events.ndjson")
    }

    /// Path a rendered unit file is written to.
    pub fn unit_path(&self, file_name: &str) -> PathBuf {
        self.unit_dir.join(file_name)
    }
}

/// Walk up from `start` to the nearest directory containing `deploy.yaml`.
fn find_project_root(start: &Path) -> Result<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| {
                VoxError::UserError(format!("failed to get current working directory: {}", e))
            })?
            .join(start)
    };

    for dir in start.ancestors() {
        if dir.join(CONFIG_FILE).is_file() {
            return Ok(dir.to_path_buf());
        }
    }

    Err(VoxError::UserError(format!(
        "no {} found in '{}' or any parent directory.\n\n\
         Run `voxdeploy init` to create one.",
        CONFIG_FILE,
        start.display()
    )))
}
