//! Implementation of the `voxdeploy init` command.
//!
//! # What `voxdeploy init` does
//!
//! 1. Writes a starter `deploy.yaml` in the current directory (if missing)
//!    declaring the orchestrator and tool-handler packages and services,
//!    both disabled
//! 2. Creates the store, unit and state directories
//! 3. Writes `.voxdeploy/.gitignore` so built artifacts stay untracked
//! 4. Appends an `init` event
//!
//! This command is idempotent: an existing `deploy.yaml` is loaded and
//! validated, never overwritten.

mod scaffolding;


use crate::config::CONFIG_FILE;
use crate::context::DeployContext;
use crate::error::{Result, VoxError};
use crate::events::{Event, EventAction, append_event};
use serde_json::json;
use std::env;

use scaffolding::*;

/// Execute the `voxdeploy init` command.
pub fn cmd_init() -> Result<()> {
    let cwd = env::current_dir().map_err(|e| {
        VoxError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    let config_path = cwd.join(CONFIG_FILE);
    let created = write_starter_config(&config_path)?;

    let ctx = DeployContext::resolve_from(&cwd)?;
    create_project_dirs(&ctx)?;

    let event = Event::new(EventAction::Init).with_details(json!({
        "config": ctx.config_path().display().to_string(),
        "created_config": created,
        "store_dir": ctx.store_dir.display().to_string(),
    }));
    append_event(&ctx, &event)?;

    if created {
        println!("Created {}", ctx.config_path().display());
    } else {
        println!("Using existing {}", ctx.config_path().display());
    }
    println!("  store: {}", ctx.store_dir.display());
    println!("  units: {}", ctx.unit_dir.display());
    println!();
    println!("Next: set 'enable: true' for the services to deploy, then run");
    println!("`voxdeploy build` and `voxdeploy compile`.");

    Ok(())
}
