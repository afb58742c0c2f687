//! Installed artifacts.
//!
//! Layout of an installed artifact:
//!
//! ```text
//! <store>/<id-prefix>-<name>/
//!   bin/<binary>               launcher
//!   lib/<name>/...             application source, fixtures removed
//!   share/<name>/<aux file>    auxiliary data (tools.json)
//!   voxdeploy-artifact.json    manifest; marks the artifact as installed
//! ```

use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name at the artifact root.
pub const MANIFEST_FILE: &str = "voxdeploy-artifact.json";

/// Number of id characters used in the store directory name.
pub const STORE_ID_PREFIX_LEN: usize = 32;

/// Manifest written into every installed artifact.
///
/// Contains only build inputs, never timestamps, so rebuilding identical
/// inputs reproduces it byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    /// Full SHA-256 artifact id.
    pub id: String,
    pub binary: String,
    pub entry_point: String,
    pub interpreter: String,
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_file: Option<String>,
}

/// Store directory name for an artifact.
pub fn store_dir_name(id: &str, name: &str) -> String {
    let prefix = &id[..id.len().min(STORE_ID_PREFIX_LEN)];
    format!("{}-{}", prefix, name)
}

/// An installed, immutable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact root directory.
    pub path: PathBuf,
    pub manifest: ArtifactManifest,
}

impl Artifact {
    /// Open the installed artifact rooted at `path`.
    ///
    /// Fails when the manifest is missing or unreadable, or when the entry
    /// point it names is not present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest_path = path.join(MANIFEST_FILE);

        let content = fs::read_to_string(&manifest_path).map_err(|e| {
            VoxError::UserError(format!(
                "'{}' is not an installed artifact (cannot read {}: {})",
                path.display(),
                MANIFEST_FILE,
                e
            ))
        })?;
        let manifest: ArtifactManifest = serde_json::from_str(&content).map_err(|e| {
            VoxError::UserError(format!(
                "corrupt artifact manifest '{}': {}",
                manifest_path.display(),
                e
            ))
        })?;

        let artifact = Self {
            path: path.to_path_buf(),
            manifest,
        };
        if !artifact.executable().is_file() {
            return Err(VoxError::UserError(format!(
                "artifact '{}' has no entry point at {}",
                path.display(),
                artifact.executable().display()
            )));
        }

        Ok(artifact)
    }

    /// The launcher path (`bin/<binary>`).
    pub fn executable(&self) -> PathBuf {
        self.path.join("bin").join(&self.manifest.binary)
    }

    /// Directory holding the auxiliary data file.
    pub fn data_dir(&self) -> PathBuf {
        self.path.join("share").join(&self.manifest.name)
    }

    /// Directory holding the installed application source.
    pub fn lib_dir(&self) -> PathBuf {
        self.path.join("lib").join(&self.manifest.name)
    }
}
