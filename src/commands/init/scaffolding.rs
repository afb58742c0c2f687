//! Starter configuration and project directories.

use crate::config::{DeployConfig, PackageConfig, ServiceConfig};
use crate::context::DeployContext;
use crate::error::{Result, VoxError};
use crate::fs::atomic_write_file;
use crate::variants::{ENABLE_PATH, ServiceVariant};
use std::fs;
use std::path::Path;

/// Variants the starter config declares. The monolith is left out; it
/// predates the orchestrator/tool-handler split.
const STARTER_VARIANTS: [ServiceVariant; 2] =
    [ServiceVariant::Orchestrator, ServiceVariant::ToolHandler];

/// A config declaring one package and one disabled service per starter variant.
pub(super) fn starter_config() -> DeployConfig {
    let mut config = DeployConfig::default();

    for variant in STARTER_VARIANTS {
        let name = variant.name().to_string();

        config.packages.insert(
            name.clone(),
            PackageConfig {
                source: name.clone().into(),
                binary: variant.default_binary().to_string(),
                entry_point: "main.py".to_string(),
                interpreter: "python3".to_string(),
                aux_file: "tools.json".to_string(),
                fixture_globs: vec!["tests/**".to_string(), "**/test_*.py".to_string()],
                dependencies: vec![],
            },
        );

        let mut options = serde_yaml::Mapping::new();
        options.insert(ENABLE_PATH.into(), false.into());

        config.services.insert(
            name.clone(),
            ServiceConfig {
                variant,
                package: name,
                after: match variant {
                    ServiceVariant::Orchestrator => vec!["mosquitto.service".to_string()],
                    _ => vec![],
                },
                read_write_paths: vec![],
                state_directory: false,
                options: serde_yaml::Value::Mapping(options),
            },
        );
    }

    config
}

/// Write the starter config unless `path` exists. Returns whether it was written.
pub(super) fn write_starter_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    let yaml = starter_config().to_yaml()?;
    atomic_write_file(
        path,
        &format!(
            "# voxdeploy deployment configuration\n\
             # Options per variant: `voxdeploy options <variant>`\n{}",
            yaml
        ),
    )?;
    Ok(true)
}

/// Create the store, unit and state directories and keep them untracked.
pub(super) fn create_project_dirs(ctx: &DeployContext) -> Result<()> {
    for dir in [&ctx.store_dir, &ctx.unit_dir, &ctx.state_dir] {
        fs::create_dir_all(dir).map_err(|e| {
            VoxError::UserError(format!(
                "failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let default_root = ctx.project_root.join(".voxdeploy");
    if default_root.is_dir() {
        let gitignore = default_root.join(".gitignore");
        if !gitignore.exists() {
            atomic_write_file(&gitignore, "# Built artifacts and local state\n*\n")?;
        }
    }

    Ok(())
}
