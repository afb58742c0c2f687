//! Deployment configuration for voxdeploy.
//!
//! This module defines the `DeployConfig` struct that represents `deploy.yaml`
//! at the project root. Unknown fields are ignored, optional fields take
//! defaults, and `validate` checks everything that can be checked without
//! touching the source trees.

mod model;
mod operations;
pub mod types;


pub use model::DeployConfig;
pub use types::{PackageConfig, ServiceConfig};

/// Name of the deployment configuration file.
pub const CONFIG_FILE: &str = "deploy.yaml";
