//! Error types for voxdeploy.
//!
//! Uses thiserror for derive macros. Every failure is fatal and deterministic:
//! nothing is retried internally, and messages name the offending option path
//! or file so the operator can fix the input and re-run.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for voxdeploy operations.
#[derive(Error, Debug)]
pub enum VoxError {
    /// Invalid arguments, unreadable project files, or unknown names.
    #[error("{0}")]
    UserError(String),

    /// Malformed or duplicate option declarations.
    #[error("schema error: {0}")]
    Schema(String),

    /// An override's type disagrees with the declared option type.
    #[error("option '{path}': expected {expected}, got {actual}")]
    Resolution {
        path: String,
        expected: String,
        actual: String,
    },

    /// Artifact production failed.
    #[error("build failed: {0}")]
    Build(String),

    /// Process unit synthesis failed.
    #[error("compile failed: {0}")]
    Compile(String),
}

impl VoxError {
    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VoxError::UserError(_) => exit_codes::USER_ERROR,
            VoxError::Schema(_) | VoxError::Resolution { .. } => exit_codes::CONFIG_FAILURE,
            VoxError::Build(_) => exit_codes::BUILD_FAILURE,
            VoxError::Compile(_) => exit_codes::COMPILE_FAILURE,
        }
    }

    pub(crate) fn resolution(
        path: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        VoxError::Resolution {
            path: path.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type alias for voxdeploy operations.
pub type Result<T> = std::result::Result<T, VoxError>;
