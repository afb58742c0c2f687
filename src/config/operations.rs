//! Config loading, validation, and lookup operations.

use super::model::DeployConfig;
use super::types::{PackageConfig, ServiceConfig, config_error};
use crate::build::BuildPlan;
use crate::error::{Result, VoxError};
use crate::unit::ServiceDescriptor;
use crate::variants::ENABLE_PATH;
use std::path::{Path, PathBuf};

impl DeployConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(DeployConfig)` - Successfully loaded and validated config
    /// * `Err(VoxError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            VoxError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document parses as null, which serde_yaml rejects for a struct.
        let config: DeployConfig = if yaml.trim().is_empty() {
            DeployConfig::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| VoxError::UserError(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| VoxError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - package and binary names are single path components
    /// - dependency pins are well-formed `name==version` and not conflicting
    /// - service names are usable as unit names
    /// - every service package is either declared or a path
    pub fn validate(&self) -> Result<()> {
        for (name, package) in &self.packages {
            package
                .to_descriptor(name, Path::new("."))
                .map_err(|e| config_error("package", name, e))?;
        }

        for (name, service) in &self.services {
            if name.is_empty()
                || name
                    .chars()
                    .any(|c| c.is_whitespace() || c == '/' || c == '\\')
            {
                return Err(VoxError::UserError(format!(
                    "config validation failed: invalid service name '{}'",
                    name
                )));
            }

            if !service.package_is_path() && !self.packages.contains_key(&service.package) {
                return Err(VoxError::UserError(format!(
                    "config validation failed: service '{}' references undeclared package '{}'. \
                     Declare it under 'packages' or give a path to an installed artifact.",
                    name, service.package
                )));
            }
        }

        Ok(())
    }

    /// Look up a declared service.
    pub fn service(&self, name: &str) -> Result<&ServiceConfig> {
        self.services.get(name).ok_or_else(|| {
            VoxError::UserError(format!(
                "unknown service '{}'. Declared services: {}",
                name,
                join_names(self.services.keys())
            ))
        })
    }

    /// Look up a declared package.
    pub fn package(&self, name: &str) -> Result<&PackageConfig> {
        self.packages.get(name).ok_or_else(|| {
            VoxError::UserError(format!(
                "unknown package '{}'. Declared packages: {}",
                name,
                join_names(self.packages.keys())
            ))
        })
    }

    /// Resolve service `name` and build its compiler input.
    ///
    /// A declared package resolves to its content-addressed path in `store`
    /// (whether or not it has been built yet); any other package is a path
    /// relative to `root`.
    pub fn service_descriptor(
        &self,
        name: &str,
        root: &Path,
        store: &Path,
    ) -> Result<ServiceDescriptor> {
        let service = self.service(name)?;
        let record = service.resolve()?;

        let enabled = record.bool(ENABLE_PATH).unwrap_or(false);
        let (package, binary) = match self.packages.get(&service.package) {
            // Disabled services are never built, so their store path is not computed.
            Some(pkg) if enabled => (
                self.locate_package(name, &service.package, pkg, root, store)?,
                pkg.binary.clone(),
            ),
            Some(pkg) => (root.join(&pkg.source), pkg.binary.clone()),
            None => (
                root.join(&service.package),
                service.variant.default_binary().to_string(),
            ),
        };

        let mut descriptor = ServiceDescriptor::from_record(
            name,
            service.variant,
            &record,
            package,
            service.after.clone(),
        )?;
        descriptor.binary = binary;
        descriptor.read_write_paths = service.read_write_paths.clone();
        descriptor.state_directory = service.state_directory;
        Ok(descriptor)
    }

    fn locate_package(
        &self,
        service: &str,
        package_name: &str,
        package: &PackageConfig,
        root: &Path,
        store: &Path,
    ) -> Result<PathBuf> {
        let descriptor = package.to_descriptor(package_name, root)?;
        let plan = BuildPlan::new(&descriptor).map_err(|e| {
            VoxError::Compile(format!(
                "service '{}': cannot locate package '{}': {}",
                service, package_name, e
            ))
        })?;
        Ok(plan.install_path(store))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let names: Vec<&str> = names.map(String::as_str).collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
