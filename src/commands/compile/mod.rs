//! Implementation of the `voxdeploy compile` command.
//!
//! Compiles each selected service into a systemd unit file under the
//! project's unit directory.
//!
//! # What `voxdeploy compile` does
//!
//! 1. Resolves each service's options against its variant schema
//! 2. Locates each service's package in the artifact store
//! 3. Compiles every selected service; if any fails, nothing is written
//! 4. Writes `<service>.service` for each enabled service
//! 5. Removes any unit file a disabled service left from an earlier compile
//! 6. Appends a `compile` or `skip` event per service
//!
//! With `--dry-run` units are printed instead and nothing is written.


use crate::cli::CompileArgs;
use crate::context::DeployContext;
use crate::error::{Result, VoxError};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use crate::naming::UpperSnake;
use crate::unit::{ProcessUnit, compile};
use serde_json::json;
use std::fs;

/// What happened to one service.
#[derive(Debug)]
pub(crate) enum Outcome {
    Compiled(ProcessUnit),
    Skipped,
}

/// Execute the `voxdeploy compile` command.
pub fn cmd_compile(args: CompileArgs) -> Result<()> {
    let ctx = DeployContext::resolve()?;

    let names: Vec<String> = match args.service {
        Some(name) => {
            ctx.config.service(&name)?;
            vec![name]
        }
        None => ctx.config.services.keys().cloned().collect(),
    };

    // Every selected service compiles before anything is written.
    let outcomes = names
        .iter()
        .map(|name| Ok((name, compile_service(&ctx, name)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut compiled = 0;
    let mut skipped = 0;

    for (name, outcome) in outcomes {
        match outcome {
            Outcome::Compiled(unit) => {
                compiled += 1;
                if args.dry_run {
                    println!("# {}", unit.file_name());
                    print!("{}", unit.render());
                    println!();
                } else {
                    let path = write_unit(&ctx, &unit)?;
                    println!("Compiled {} -> {}", name, path.display());
                }
            }
            Outcome::Skipped => {
                skipped += 1;
                if !args.dry_run {
                    retire_unit(&ctx, name)?;
                }
                println!("Skipped {} (disabled)", name);
            }
        }
    }

    if !args.dry_run {
        println!("Compiled {} unit(s), skipped {}.", compiled, skipped);
    }

    Ok(())
}

/// Resolve and compile service `name`. Writes nothing.
pub(crate) fn compile_service(ctx: &DeployContext, name: &str) -> Result<Outcome> {
    let descriptor = ctx
        .config
        .service_descriptor(name, &ctx.project_root, &ctx.store_dir)?;

    match compile(&descriptor, &UpperSnake)? {
        Some(unit) => Ok(Outcome::Compiled(unit)),
        None => Ok(Outcome::Skipped),
    }
}

/// Write `unit` into the unit directory and record a `compile` event.
pub(crate) fn write_unit(ctx: &DeployContext, unit: &ProcessUnit) -> Result<std::path::PathBuf> {
    let path = ctx.unit_path(&unit.file_name());
    atomic_write_file(&path, &unit.render())?;

    let variables: Vec<&str> = unit.environment.keys().collect();
    let event = Event::new(EventAction::Compile)
        .with_subject(&unit.name)
        .with_details(json!({
            "unit": path.display().to_string(),
            "exec_start": unit.exec_start.display().to_string(),
            "variables": variables,
            "environment_file": unit
                .environment_file
                .as_ref()
                .map(|s| s.location().display().to_string()),
        }));
    append_event(ctx, &event)?;

    tracing::info!(service = %unit.name, unit = %path.display(), "unit written");
    Ok(path)
}

/// Remove a unit file left by an earlier compile and record a `skip` event.
pub(crate) fn retire_unit(ctx: &DeployContext, name: &str) -> Result<()> {
    let path = ctx.unit_path(&format!("{}.service", name));
    let removed = if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            VoxError::UserError(format!(
                "failed to remove stale unit '{}': {}",
                path.display(),
                e
            ))
        })?;
        true
    } else {
        false
    };

    let event = Event::new(EventAction::Skip)
        .with_subject(name)
        .with_details(json!({
            "reason": "disabled",
            "removed_unit": removed,
        }));
    append_event(ctx, &event)?;

    tracing::info!(service = %name, removed, "service disabled");
    Ok(())
}
