//! Implementation of the `voxdeploy devenv` command.

use crate::build::DevEnvironment;
use crate::cli::DevenvArgs;
use crate::context::DeployContext;
use crate::error::{Result, VoxError};

/// Execute the `voxdeploy devenv` command.
///
/// Prints a sourceable shell snippet (or JSON with `--json`) for the named
/// package. Source trees are not read; only the declared descriptor is used.
pub fn cmd_devenv(args: DevenvArgs) -> Result<()> {
    let ctx = DeployContext::resolve()?;
    let env = dev_environment(&ctx, &args)?;

    if args.json {
        let json = serde_json::to_string_pretty(&env)
            .map_err(|e| VoxError::UserError(format!("failed to encode environment: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", env.to_shell());
    }

    Ok(())
}

fn dev_environment(ctx: &DeployContext, args: &DevenvArgs) -> Result<DevEnvironment> {
    let descriptor = ctx
        .config
        .package(&args.package)?
        .to_descriptor(&args.package, &ctx.project_root)?;
    Ok(DevEnvironment::for_profile(&descriptor, args.profile))
}
