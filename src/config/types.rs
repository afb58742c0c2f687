//! Package and service entries of `deploy.yaml`, with their defaults.

use crate::build::{BuildDescriptor, DependencySet};
use crate::error::{Result, VoxError};
use crate::schema::{Overrides, SettingsRecord, overrides_from_yaml, resolve};
use crate::variants::ServiceVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One buildable application package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Source tree, relative to the project root.
    pub source: PathBuf,

    /// Entry-point name installed under `bin/`.
    pub binary: String,

    /// Script the launcher runs, relative to the source root.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Source file copied into the artifact's data directory.
    #[serde(default = "default_aux_file")]
    pub aux_file: String,

    /// Globs (relative to the source root) removed from the installed tree.
    #[serde(default = "default_fixture_globs")]
    pub fixture_globs: Vec<String>,

    /// `name==version` pins.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PackageConfig {
    /// Build descriptor for package `name`, with `source` resolved against `root`.
    pub fn to_descriptor(&self, name: &str, root: &Path) -> Result<BuildDescriptor> {
        let descriptor = BuildDescriptor {
            name: name.to_string(),
            source: root.join(&self.source),
            binary: self.binary.clone(),
            entry_point: self.entry_point.clone(),
            interpreter: self.interpreter.clone(),
            dependencies: DependencySet::parse(&self.dependencies)?,
            post_build: BuildDescriptor::standard_post_build(&self.aux_file, &self.fixture_globs),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// One deployed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub variant: ServiceVariant,

    /// Declared package name, or a path to an installed artifact.
    pub package: String,

    /// Units this service is ordered after (and wants).
    #[serde(default)]
    pub after: Vec<String>,

    /// Paths left writable under the read-only root.
    #[serde(default)]
    pub read_write_paths: Vec<PathBuf>,

    /// Give the service a private `/var/lib/<service>`.
    #[serde(default)]
    pub state_directory: bool,

    /// Option overrides, nested by path segment.
    #[serde(default)]
    pub options: serde_yaml::Value,
}

impl ServiceConfig {
    /// The flattened option overrides.
    pub fn overrides(&self) -> Result<Overrides> {
        overrides_from_yaml(&self.options)
    }

    /// Resolve this service's overrides against its variant schema.
    pub fn resolve(&self) -> Result<SettingsRecord> {
        let schema = self.variant.schema()?;
        resolve(&schema, &self.overrides()?)
    }

    /// True when `package` names an artifact path rather than a declared package.
    pub fn package_is_path(&self) -> bool {
        self.package.contains('/') || self.package.starts_with('.')
    }
}

pub(crate) fn default_entry_point() -> String {
    "main.py".to_string()
}

pub(crate) fn default_interpreter() -> String {
    "python3".to_string()
}

pub(crate) fn default_aux_file() -> String {
    "tools.json".to_string()
}

pub(crate) fn default_fixture_globs() -> Vec<String> {
    vec!["tests/**".to_string(), "**/test_*.py".to_string()]
}

pub(crate) fn default_store_dir() -> PathBuf {
    PathBuf::from(".voxdeploy/store")
}

pub(crate) fn default_unit_dir() -> PathBuf {
    PathBuf::from(".voxdeploy/units")
}

pub(crate) fn default_state_dir() -> PathBuf {
    PathBuf::from(".voxdeploy/state")
}

/// Map a build-time validation error onto a config error for `name`.
pub(crate) fn config_error(what: &str, name: &str, err: VoxError) -> VoxError {
    let detail = match err {
        VoxError::Build(msg) | VoxError::UserError(msg) | VoxError::Schema(msg) => msg,
        other => other.to_string(),
    };
    VoxError::UserError(format!(
        "config validation failed: {} '{}': {}",
        what, name, detail
    ))
}
