//! Deployment compiler.
//!
//! Turns a `ServiceDescriptor` (resolved settings, artifact reference,
//! secrets reference, activation flag) into a `ProcessUnit`: the executable
//! to run, its environment, the supervisor-side secrets indirection and the
//! sandbox and lifecycle policy. [`ProcessUnit::render`] writes the result
//! as a systemd service unit.

mod env;
mod render;

#[cfg(test)]
mod tests;

pub use env::{EnvironmentMap, UNBUFFERED_OUTPUT_VAR};

use crate::build::Artifact;
use crate::error::{Result, VoxError};
use crate::naming::{NamingConvention, SETTINGS_NAMESPACE, check_injective};
use crate::schema::{OptionValue, SettingsRecord};
use crate::secrets::SecretsReference;
use crate::variants::{ENABLE_PATH, ENVIRONMENT_FILE_PATH, ServiceVariant};
use serde::Serialize;
use std::path::PathBuf;

/// Target pulled in by default so the broker and APIs are reachable.
pub const DEFAULT_AFTER: &str = "network-online.target";

/// Default install target.
pub const DEFAULT_WANTED_BY: &str = "multi-user.target";

/// Immutable input to [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Unit name without the `.service` suffix.
    pub name: String,
    pub description: String,
    pub enabled: bool,
    /// Root of the installed artifact to run.
    pub package: PathBuf,
    /// Entry-point name under the artifact's `bin/`.
    pub binary: String,
    /// Settings projected into the environment.
    pub settings: SettingsRecord,
    pub secrets: Option<SecretsReference>,
    /// Ordering and wants edges, in declaration order.
    pub depends_on: Vec<String>,
    pub wanted_by: Vec<String>,
    /// Paths left writable under the read-only root.
    pub read_write_paths: Vec<PathBuf>,
    /// Ask the supervisor for a private writable `/var/lib/<name>`.
    pub state_directory: bool,
}

impl ServiceDescriptor {
    /// Build a descriptor from a resolved variant record.
    ///
    /// `enable` becomes the activation flag, `environmentFile` the secrets
    /// reference, and the `settings.*` entries the projected settings.
    pub fn from_record(
        name: &str,
        variant: ServiceVariant,
        record: &SettingsRecord,
        package: PathBuf,
        depends_on: Vec<String>,
    ) -> Result<Self> {
        let enabled = record.bool(ENABLE_PATH).ok_or_else(|| {
            VoxError::Compile(format!("service '{}' has no boolean '{}' option", name, ENABLE_PATH))
        })?;

        let secrets = match record.get(ENVIRONMENT_FILE_PATH) {
            Some(OptionValue::Path(Some(path))) => Some(SecretsReference::new(path)),
            Some(OptionValue::Path(None)) | None => None,
            Some(other) => {
                return Err(VoxError::Compile(format!(
                    "service '{}': '{}' must be a path, found {}",
                    name,
                    ENVIRONMENT_FILE_PATH,
                    other.kind()
                )));
            }
        };

        let mut depends_on = depends_on;
        if !depends_on.iter().any(|d| d == DEFAULT_AFTER) {
            depends_on.insert(0, DEFAULT_AFTER.to_string());
        }
        let mut seen = std::collections::HashSet::new();
        depends_on.retain(|d| seen.insert(d.clone()));

        Ok(Self {
            name: name.to_string(),
            description: variant.description().to_string(),
            enabled,
            package,
            binary: variant.default_binary().to_string(),
            settings: record.subset(SETTINGS_NAMESPACE),
            secrets,
            depends_on,
            wanted_by: vec![DEFAULT_WANTED_BY.to_string()],
            read_write_paths: vec![],
            state_directory: false,
        })
    }

    /// Check that every path handed to the supervisor is absolute; systemd
    /// skips relative `EnvironmentFile=` and `ReadWritePaths=` entries.
    pub fn check_paths(&self) -> Result<()> {
        if let Some(secrets) = &self.secrets
            && !secrets.location().is_absolute()
        {
            return Err(VoxError::Compile(format!(
                "service '{}': '{}' must be an absolute path, found '{}'",
                self.name, ENVIRONMENT_FILE_PATH, secrets
            )));
        }

        if let Some(path) = self.read_write_paths.iter().find(|p| !p.is_absolute()) {
            return Err(VoxError::Compile(format!(
                "service '{}': 'read_write_paths' entry must be an absolute path, found '{}'",
                self.name,
                path.display()
            )));
        }

        Ok(())
    }
}

/// `ProtectSystem=` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectSystem {
    /// `/usr` and `/boot` read-only.
    Full,
    /// The whole root read-only except explicitly allowed paths.
    Strict,
}

/// Sandbox directives applied to every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxPolicy {
    /// Run under a transient user allocated at start.
    pub dynamic_user: bool,
    pub protect_system: ProtectSystem,
    pub protect_home: bool,
    pub private_tmp: bool,
    pub no_new_privileges: bool,
    pub read_write_paths: Vec<PathBuf>,
    /// `StateDirectory=` name, owned by the transient user.
    pub state_directory: Option<String>,
}

impl SandboxPolicy {
    /// Transient identity, read-only root, isolated home and `/tmp`.
    pub fn hardened(read_write_paths: Vec<PathBuf>) -> Self {
        Self {
            dynamic_user: true,
            protect_system: ProtectSystem::Strict,
            protect_home: true,
            private_tmp: true,
            no_new_privileges: true,
            read_write_paths,
            state_directory: None,
        }
    }
}

/// Supervisor restart policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartPolicy {
    pub restart: String,
    pub restart_sec: u32,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            restart: "on-failure".to_string(),
            restart_sec: 5,
        }
    }
}

/// A compiled supervised-process description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessUnit {
    pub name: String,
    pub description: String,
    pub exec_start: PathBuf,
    pub environment: EnvironmentMap,
    /// File the supervisor merges into the environment at process start.
    pub environment_file: Option<SecretsReference>,
    pub sandbox: SandboxPolicy,
    pub restart: RestartPolicy,
    pub after: Vec<String>,
    pub wanted_by: Vec<String>,
}

impl ProcessUnit {
    /// Unit file name (`<name>.service`).
    pub fn file_name(&self) -> String {
        format!("{}.service", self.name)
    }
}

/// Compile `descriptor` into a process unit.
///
/// A disabled descriptor compiles to `Ok(None)`. Supervisor-side paths must
/// be absolute. The package must be an installed artifact providing the
/// descriptor's binary, and the naming convention must map every setting to
/// a distinct variable.
pub fn compile(
    descriptor: &ServiceDescriptor,
    naming: &dyn NamingConvention,
) -> Result<Option<ProcessUnit>> {
    if !descriptor.enabled {
        tracing::debug!(service = %descriptor.name, "service disabled; no unit emitted");
        return Ok(None);
    }

    descriptor.check_paths()?;

    let artifact = Artifact::open(&descriptor.package).map_err(|e| {
        VoxError::Compile(format!(
            "service '{}': package does not resolve to an installed artifact: {}",
            descriptor.name, e
        ))
    })?;

    let exec_start = artifact.path.join("bin").join(&descriptor.binary);
    if !exec_start.is_file() {
        return Err(VoxError::Compile(format!(
            "service '{}': artifact '{}' has no binary '{}'",
            descriptor.name,
            artifact.path.display(),
            descriptor.binary
        )));
    }

    check_injective(descriptor.settings.iter().map(|(path, _)| path), naming)?;

    let mut environment = EnvironmentMap::from_settings(&descriptor.settings, naming);
    if environment.contains(UNBUFFERED_OUTPUT_VAR) {
        return Err(VoxError::Compile(format!(
            "service '{}': a setting maps to reserved variable {}",
            descriptor.name, UNBUFFERED_OUTPUT_VAR
        )));
    }
    environment.insert(UNBUFFERED_OUTPUT_VAR, "1");

    let mut sandbox = SandboxPolicy::hardened(descriptor.read_write_paths.clone());
    if descriptor.state_directory {
        sandbox.state_directory = Some(descriptor.name.clone());
    }

    tracing::debug!(
        service = %descriptor.name,
        vars = environment.len(),
        secrets = descriptor.secrets.is_some(),
        "compiled process unit"
    );

    Ok(Some(ProcessUnit {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        exec_start,
        environment,
        environment_file: descriptor.secrets.clone(),
        sandbox,
        restart: RestartPolicy::default(),
        after: descriptor.depends_on.clone(),
        wanted_by: descriptor.wanted_by.clone(),
    }))
}
