//! Display and reporting functions for the doctor command.

use super::{DoctorReport, IssueSeverity};

/// Print the doctor report.
pub fn print_report(report: &DoctorReport) {
    if !report.has_issues() {
        println!("Deployment is healthy. No issues detected.");
        return;
    }

    println!("Issues detected ({}):", report.issues.len());
    println!();

    for (i, issue) in report.issues.iter().enumerate() {
        println!(
            "  {}. [{}] {} - {}",
            i + 1,
            issue.severity,
            issue.category,
            issue.description
        );

        if let Some(path) = &issue.path {
            println!("     Path: {}", path);
        }

        if let Some(remediation) = &issue.remediation {
            println!(
                "     Fix:  {}",
                remediation.lines().next().unwrap_or(remediation)
            );
            for line in remediation.lines().skip(1) {
                println!("           {}", line);
            }
        }

        println!();
    }

    let error_count = report
        .issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Error)
        .count();
    let warning_count = report.issues.len() - error_count;

    println!(
        "Summary: {} errors, {} warnings.",
        error_count, warning_count
    );
}
