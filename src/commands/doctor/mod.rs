//! Implementation of the `voxdeploy doctor` command.
//!
//! Diagnoses the deployment project without changing it. Reports:
//! - Packages whose source tree, entry point or auxiliary file is missing
//! - Services whose options do not resolve
//! - Enabled services whose package has not been built
//! - Enabled services whose secrets file is not provisioned
//! - Unit files that are missing, out of date, or left from a disabled service
//! - Variant option tables that map two options to one environment variable

mod checks;
mod display;

#[cfg(test)]
mod tests;

use crate::context::DeployContext;
use crate::error::{Result, VoxError};

pub use checks::*;
pub use display::*;

/// Severity level for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Deployment will work but something is stale or not yet provisioned.
    Warning,
    /// Build or compile will fail until this is fixed.
    Error,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::Warning => write!(f, "WARNING"),
            IssueSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// A detected issue with a recommended fix.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: IssueSeverity,
    /// Category of the issue (e.g. `missing_source`, `unit_outdated`).
    pub category: String,
    pub description: String,
    /// Path or identifier involved.
    pub path: Option<String>,
    /// Recommended remediation command or action.
    pub remediation: Option<String>,
}

impl Issue {
    pub fn new(severity: IssueSeverity, category: &str, description: &str) -> Self {
        Self {
            severity,
            category: category.to_string(),
            description: description.to_string(),
            path: None,
            remediation: None,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }
}

/// Result of running the doctor checks.
#[derive(Debug, Default)]
pub struct DoctorReport {
    pub issues: Vec<Issue>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }

    /// Issues in `category`.
    #[cfg(test)]
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.category == category)
    }
}

/// Run every check against `ctx`.
pub fn diagnose(ctx: &DeployContext) -> DoctorReport {
    let mut report = DoctorReport::new();

    check_naming(&mut report);
    check_package_sources(ctx, &mut report);
    check_services(ctx, &mut report);
    check_event_log(ctx, &mut report);

    report
}

/// Execute the `voxdeploy doctor` command.
///
/// Warnings alone exit successfully; any error exits with a user error.
pub fn cmd_doctor() -> Result<()> {
    let ctx = DeployContext::resolve()?;
    let report = diagnose(&ctx);

    print_report(&report);

    if report.has_errors() {
        return Err(VoxError::UserError(format!(
            "Found {} issue(s), including errors. Fix them and re-run `voxdeploy doctor`.",
            report.issues.len()
        )));
    }

    Ok(())
}
