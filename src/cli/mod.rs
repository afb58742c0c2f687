//! CLI argument parsing for voxdeploy.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::build::DevProfile;
use clap::{ArgAction, Parser, Subcommand};

/// voxdeploy: typed configuration and deployment compiler for voice-assistant services.
///
/// A project is a directory holding `deploy.yaml`:
/// - packages are built into a content-addressed store
/// - services resolve their variant's options against overrides
/// - enabled services compile to sandboxed systemd units
#[derive(Parser, Debug)]
#[command(name = "voxdeploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log debug diagnostics to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for voxdeploy.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a starter deploy.yaml in the current directory.
    ///
    /// Declares one disabled service per variant. Never overwrites an
    /// existing file.
    Init,

    /// List the options a service variant declares.
    ///
    /// Shows each option's path, type, default and environment variable.
    Options(OptionsArgs),

    /// Resolve a service's options against its overrides.
    ///
    /// Prints every option with its effective value and the environment
    /// the service would receive.
    Resolve(ResolveArgs),

    /// Build packages into the artifact store.
    ///
    /// Builds every declared package, or only the one named. Packages
    /// already in the store are reused.
    Build(BuildArgs),

    /// Compile services into systemd unit files.
    ///
    /// Disabled services are skipped. Every enabled service's package must
    /// already be built.
    Compile(CompileArgs),

    /// Compare the option schemas of two service variants.
    Diff(DiffArgs),

    /// Print a development environment for a package.
    ///
    /// Uses the same dependency set as the production build.
    Devenv(DevenvArgs),

    /// Diagnose the deployment project.
    ///
    /// Reports missing sources, unbuilt packages, unprovisioned secrets
    /// files and out-of-date unit files.
    Doctor,
}

/// Arguments for the `options` command.
#[derive(Parser, Debug)]
pub struct OptionsArgs {
    /// Variant name (orchestrator, tool-handler, monolith).
    pub variant: String,

    /// Print the schema as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Service name as declared in deploy.yaml.
    pub service: String,

    /// Print the resolved record as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `build` command.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Package to build. If omitted, builds every declared package.
    pub package: Option<String>,
}

/// Arguments for the `compile` command.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Service to compile. If omitted, compiles every declared service.
    pub service: Option<String>,

    /// Print unit files instead of writing them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `diff` command.
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Left-hand variant.
    pub left: String,

    /// Right-hand variant.
    pub right: String,
}

/// Arguments for the `devenv` command.
#[derive(Parser, Debug)]
pub struct DevenvArgs {
    /// Package name as declared in deploy.yaml.
    pub package: String,

    /// Tooling profile.
    #[arg(long, value_enum, default_value_t = DevProfile::Default)]
    pub profile: DevProfile,

    /// Print the environment as JSON instead of a shell script.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["voxdeploy", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["voxdeploy", "doctor", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Doctor));
    }

    #[test]
    fn parse_options() {
        let cli = Cli::try_parse_from(["voxdeploy", "options", "tool-handler", "--json"]).unwrap();
        match cli.command {
            Command::Options(args) => {
                assert_eq!(args.variant, "tool-handler");
                assert!(args.json);
            }
            other => panic!("Expected Options command, got {:?}", other),
        }
    }

    #[test]
    fn parse_build_without_package() {
        let cli = Cli::try_parse_from(["voxdeploy", "build"]).unwrap();
        match cli.command {
            Command::Build(args) => assert!(args.package.is_none()),
            other => panic!("Expected Build command, got {:?}", other),
        }
    }

    #[test]
    fn parse_compile_dry_run() {
        let cli =
            Cli::try_parse_from(["voxdeploy", "compile", "orchestrator", "--dry-run"]).unwrap();
        match cli.command {
            Command::Compile(args) => {
                assert_eq!(args.service.as_deref(), Some("orchestrator"));
                assert!(args.dry_run);
            }
            other => panic!("Expected Compile command, got {:?}", other),
        }
    }

    #[test]
    fn parse_diff_requires_two_variants() {
        assert!(Cli::try_parse_from(["voxdeploy", "diff", "orchestrator"]).is_err());
        let cli =
            Cli::try_parse_from(["voxdeploy", "diff", "orchestrator", "tool-handler"]).unwrap();
        assert!(matches!(cli.command, Command::Diff(_)));
    }

    #[test]
    fn parse_devenv_profile() {
        let cli = Cli::try_parse_from(["voxdeploy", "devenv", "orchestrator", "--profile", "ci"])
            .unwrap();
        match cli.command {
            Command::Devenv(args) => {
                assert_eq!(args.package, "orchestrator");
                assert_eq!(args.profile, DevProfile::Ci);
                assert!(!args.json);
            }
            other => panic!("Expected Devenv command, got {:?}", other),
        }
    }

    #[test]
    fn devenv_profile_defaults() {
        let cli = Cli::try_parse_from(["voxdeploy", "devenv", "orchestrator"]).unwrap();
        match cli.command {
            Command::Devenv(args) => assert_eq!(args.profile, DevProfile::Default),
            other => panic!("Expected Devenv command, got {:?}", other),
        }
    }
}
