//! Implementation of the `voxdeploy resolve` command.
//!
//! Shows the effective value of every option for one service, marking the
//! overridden ones, followed by the environment its unit would carry.

use crate::cli::ResolveArgs;
use crate::context::DeployContext;
use crate::error::{Result, VoxError};
use crate::naming::{SETTINGS_NAMESPACE, UpperSnake};
use crate::schema::{Overrides, SettingsRecord};
use crate::unit::{EnvironmentMap, UNBUFFERED_OUTPUT_VAR};
use serde_json::json;
use std::fmt::Write as _;

/// Execute the `voxdeploy resolve` command.
pub fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let ctx = DeployContext::resolve()?;
    let service = ctx.config.service(&args.service)?;
    let overrides = service.overrides()?;
    let record = service.resolve()?;
    let environment = service_environment(&record);

    if args.json {
        let doc = json!({
            "service": args.service,
            "variant": service.variant.name(),
            "settings": record,
            "environment": environment,
        });
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| VoxError::UserError(format!("failed to encode settings: {}", e)))?;
        println!("{}", text);
    } else {
        print!(
            "{}",
            format_resolution(&args.service, &record, &overrides, &environment)
        );
    }

    Ok(())
}

/// The environment a compiled unit for `record` would carry.
fn service_environment(record: &SettingsRecord) -> EnvironmentMap {
    let mut environment = EnvironmentMap::from_settings(&record.subset(SETTINGS_NAMESPACE), &UpperSnake);
    environment.insert(UNBUFFERED_OUTPUT_VAR, "1");
    environment
}

fn format_resolution(
    service: &str,
    record: &SettingsRecord,
    overrides: &Overrides,
    environment: &EnvironmentMap,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Service: {}", service);
    let _ = writeln!(out);

    for (path, value) in record.iter() {
        let marker = if overrides.contains_key(path) { "*" } else { " " };
        let _ = writeln!(out, "{} {} = {}", marker, path, value);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Environment:");
    for (name, value) in environment.iter() {
        let _ = writeln!(out, "  {}={}", name, value);
    }

    out
}
