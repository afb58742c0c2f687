//! Late-bound secrets file references.
//!
//! A `SecretsReference` names an operator-owned `KEY=VALUE` file that the
//! process supervisor merges into the service environment when the process
//! starts. voxdeploy never opens the file: the type carries the path for
//! rendering and existence checks, and nothing else.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Secret keys the deployed services read from their secrets file.
pub const KNOWN_SECRET_KEYS: &[&str] = &[
    "HA_TOKEN",
    "HA_TOKEN_FILE",
    "SPOTIFY_CLIENT_ID",
    "SPOTIFY_CLIENT_SECRET",
    "LLM_API_KEY",
    "S3_SECRET_KEY",
];

/// Opaque reference to an external secrets file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecretsReference(PathBuf);

impl SecretsReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The referenced location, as written into the unit file.
    pub fn location(&self) -> &Path {
        &self.0
    }

    /// Whether something exists at the referenced location right now.
    ///
    /// Only metadata is consulted. A missing file is not a compile error:
    /// the file belongs to the deployment environment and may be provisioned
    /// after the unit is written.
    pub fn is_provisioned(&self) -> bool {
        self.0.exists()
    }
}

impl fmt::Display for SecretsReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
