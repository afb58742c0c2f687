//! DeployConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Contents of `deploy.yaml`.
///
/// Directories are relative to the project root. Unknown fields in the YAML
/// are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    // =========================================================================
    // Layout
    // =========================================================================
    /// Content-addressed artifact store.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Where rendered unit files are written.
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,

    /// Event log directory.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    // =========================================================================
    // Packages and services
    // =========================================================================
    #[serde(default)]
    pub packages: BTreeMap<String, PackageConfig>,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            unit_dir: default_unit_dir(),
            state_dir: default_state_dir(),
            packages: BTreeMap::new(),
            services: BTreeMap::new(),
        }
    }
}
