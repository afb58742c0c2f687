//! Command implementations for voxdeploy.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod build;
mod compile;
mod devenv;
mod diff;
mod doctor;
mod init;
mod options;
mod resolve;

use crate::cli::Command;
use crate::error::{Result, VoxError};
use crate::variants::ServiceVariant;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(),
        Command::Options(args) => options::cmd_options(args),
        Command::Resolve(args) => resolve::cmd_resolve(args),
        Command::Build(args) => build::cmd_build(args),
        Command::Compile(args) => compile::cmd_compile(args),
        Command::Diff(args) => diff::cmd_diff(args),
        Command::Devenv(args) => devenv::cmd_devenv(args),
        Command::Doctor => doctor::cmd_doctor(),
    }
}

/// Parse a variant name given on the command line.
fn parse_variant(name: &str) -> Result<ServiceVariant> {
    ServiceVariant::from_str(name).ok_or_else(|| {
        let known: Vec<&str> = ServiceVariant::ALL.iter().map(|v| v.name()).collect();
        VoxError::UserError(format!(
            "unknown variant '{}'. Known variants: {}",
            name,
            known.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variant_accepts_known_names() {
        assert_eq!(parse_variant("monolith").unwrap(), ServiceVariant::Monolith);
        assert_eq!(
            parse_variant("tool-handler").unwrap(),
            ServiceVariant::ToolHandler
        );
    }

    #[test]
    fn parse_variant_lists_known_names() {
        let msg = parse_variant("speaker-id").unwrap_err().to_string();
        assert!(msg.contains("orchestrator, tool-handler, monolith"));
    }
}
