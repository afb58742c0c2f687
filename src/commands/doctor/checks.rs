//! Health check functions for the doctor command.

use super::{DoctorReport, Issue, IssueSeverity};
use crate::build::Artifact;
use crate::config::ServiceConfig;
use crate::context::DeployContext;
use crate::events::read_events;
use crate::naming::{
    NamingConvention, SETTINGS_NAMESPACE, UpperSnake, check_injective, schema_paths,
};
use crate::secrets::KNOWN_SECRET_KEYS;
use crate::unit::compile;
use crate::variants::ServiceVariant;
use std::path::Path;

/// Check that every variant's settings map to distinct variable names, none
/// of which is reserved for the secrets file.
pub fn check_naming(report: &mut DoctorReport) {
    for variant in ServiceVariant::ALL {
        let schema = match variant.schema() {
            Ok(schema) => schema,
            Err(e) => {
                report.push(Issue::new(
                    IssueSeverity::Error,
                    "invalid_schema",
                    &format!("variant '{}': {}", variant, e),
                ));
                continue;
            }
        };

        let settings = schema.subset(SETTINGS_NAMESPACE);
        if let Err(e) = check_injective(schema_paths(&settings), &UpperSnake) {
            report.push(Issue::new(
                IssueSeverity::Error,
                "naming_collision",
                &format!("variant '{}': {}", variant, e),
            ));
        }

        for option in settings.options() {
            let var = UpperSnake.env_name(&option.path);
            if KNOWN_SECRET_KEYS.contains(&var.as_str()) {
                report.push(Issue::new(
                    IssueSeverity::Error,
                    "shadows_secret",
                    &format!(
                        "variant '{}': option '{}' maps to secret variable {}",
                        variant, option.path, var
                    ),
                ));
            }
        }
    }
}

/// Check that each declared package's source tree holds the files a build needs.
pub fn check_package_sources(ctx: &DeployContext, report: &mut DoctorReport) {
    for (name, package) in &ctx.config.packages {
        let source = ctx.project_root.join(&package.source);
        if !source.is_dir() {
            report.push(
                Issue::new(
                    IssueSeverity::Error,
                    "missing_source",
                    &format!("source tree of package '{}' does not exist", name),
                )
                .with_path(&source.display().to_string())
                .with_remediation(&format!(
                    "Check 'packages.{}.source' in deploy.yaml",
                    name
                )),
            );
            continue;
        }

        for (category, file) in [
            ("missing_entry_point", &package.entry_point),
            ("missing_aux_file", &package.aux_file),
        ] {
            let path = source.join(file);
            if !path.is_file() {
                report.push(
                    Issue::new(
                        IssueSeverity::Error,
                        category,
                        &format!("package '{}' has no '{}'", name, file),
                    )
                    .with_path(&path.display().to_string()),
                );
            }
        }
    }
}

/// Check each service: options, build state, secrets file and unit file.
pub fn check_services(ctx: &DeployContext, report: &mut DoctorReport) {
    for (name, service) in &ctx.config.services {
        if let Err(e) = service.resolve() {
            report.push(Issue::new(
                IssueSeverity::Error,
                "unresolved_options",
                &format!("service '{}': {}", name, e),
            ));
            continue;
        }

        let descriptor =
            match ctx
                .config
                .service_descriptor(name, &ctx.project_root, &ctx.store_dir)
            {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    report.push(Issue::new(
                        IssueSeverity::Error,
                        "package_unresolved",
                        &format!("service '{}': {}", name, e),
                    ));
                    continue;
                }
            };

        let unit_path = ctx.unit_path(&format!("{}.service", name));

        if !descriptor.enabled {
            if unit_path.exists() {
                report.push(
                    Issue::new(
                        IssueSeverity::Warning,
                        "stale_unit",
                        &format!("service '{}' is disabled but its unit file remains", name),
                    )
                    .with_path(&unit_path.display().to_string())
                    .with_remediation(&format!("voxdeploy compile {}", name)),
                );
            }
            continue;
        }

        if let Err(e) = descriptor.check_paths() {
            report.push(
                Issue::new(IssueSeverity::Error, "relative_path", &e.to_string())
                    .with_remediation(&format!(
                        "Use absolute paths in 'services.{}' of deploy.yaml",
                        name
                    )),
            );
            continue;
        }

        if let Some(secrets) = &descriptor.secrets
            && !secrets.is_provisioned()
        {
            report.push(
                Issue::new(
                    IssueSeverity::Warning,
                    "secrets_missing",
                    &format!("secrets file for service '{}' does not exist", name),
                )
                .with_path(&secrets.to_string())
                .with_remediation(&format!(
                    "Create it with KEY=VALUE lines for:\n{}",
                    service.variant.secret_keys().join(", ")
                )),
            );
        }

        let artifact = match Artifact::open(&descriptor.package) {
            Ok(artifact) => artifact,
            Err(_) => {
                report_not_built(report, name, service, &descriptor.package);
                continue;
            }
        };
        check_artifact_contents(&artifact, report);

        let unit = match compile(&descriptor, &UpperSnake) {
            Ok(Some(unit)) => unit,
            Ok(None) => continue,
            Err(e) => {
                report.push(Issue::new(
                    IssueSeverity::Error,
                    "compile_failed",
                    &format!("service '{}': {}", name, e),
                ));
                continue;
            }
        };

        match std::fs::read_to_string(&unit_path) {
            Err(_) => report.push(
                Issue::new(
                    IssueSeverity::Warning,
                    "unit_missing",
                    &format!("unit file for service '{}' has not been written", name),
                )
                .with_path(&unit_path.display().to_string())
                .with_remediation(&format!("voxdeploy compile {}", name)),
            ),
            Ok(text) if text != unit.render() => report.push(
                Issue::new(
                    IssueSeverity::Warning,
                    "unit_outdated",
                    &format!("unit file for service '{}' is out of date", name),
                )
                .with_path(&unit_path.display().to_string())
                .with_remediation(&format!("voxdeploy compile {}", name)),
            ),
            Ok(_) => {}
        }
    }
}

/// Check that the event log parses.
pub fn check_event_log(ctx: &DeployContext, report: &mut DoctorReport) {
    if let Err(e) = read_events(ctx) {
        report.push(
            Issue::new(IssueSeverity::Warning, "events_unreadable", &e.to_string())
                .with_path(&ctx.events_file().display().to_string()),
        );
    }
}

fn report_not_built(
    report: &mut DoctorReport,
    name: &str,
    service: &ServiceConfig,
    package: &Path,
) {
    let remediation = if service.package_is_path() {
        "Install the artifact at this path".to_string()
    } else {
        format!("voxdeploy build {}", service.package)
    };
    report.push(
        Issue::new(
            IssueSeverity::Warning,
            "not_built",
            &format!(
                "package '{}' of service '{}' is not in the store",
                service.package, name
            ),
        )
        .with_path(&package.display().to_string())
        .with_remediation(&remediation),
    );
}

/// Check that an installed artifact still holds its entry point and data file.
fn check_artifact_contents(artifact: &Artifact, report: &mut DoctorReport) {
    let manifest = &artifact.manifest;
    let mut expected = vec![artifact.lib_dir().join(&manifest.entry_point)];
    if let Some(aux) = &manifest.aux_file {
        expected.push(artifact.data_dir().join(aux));
    }

    for path in expected.into_iter().filter(|p| !p.is_file()) {
        report.push(
            Issue::new(
                IssueSeverity::Error,
                "artifact_incomplete",
                &format!("artifact of package '{}' is missing a file", manifest.name),
            )
            .with_path(&path.display().to_string())
            .with_remediation(&format!(
                "Remove {} and rebuild",
                artifact.path.display()
            )),
        );
    }
}
