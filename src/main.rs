//! voxdeploy: typed configuration and deployment compiler for voice-assistant services.
//!
//! This is the main entry point for the `voxdeploy` CLI. It parses arguments,
//! sets up diagnostic logging, dispatches to the appropriate command handler,
//! and maps errors to exit codes.

pub mod build;
mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod naming;
pub mod schema;
pub mod secrets;
pub mod unit;
pub mod variants;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for unit text and JSON.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects debug and the default is warn.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "voxdeploy=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
