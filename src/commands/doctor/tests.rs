//! Tests for the doctor command.

use super::*;
use crate::commands::build::build_package;
use crate::commands::compile::{Outcome, compile_service, write_unit};
use crate::test_support::{DirGuard, SAMPLE_DEPLOY_YAML, create_test_project};
use serial_test::serial;

fn categories(report: &DoctorReport) -> Vec<&str> {
    report.issues.iter().map(|i| i.category.as_str()).collect()
}

#[test]
fn test_variant_tables_have_no_naming_collisions() {
    let mut report = DoctorReport::new();
    check_naming(&mut report);
    assert!(!report.has_issues(), "{:?}", categories(&report));
}

#[test]
fn test_fresh_project_reports_unbuilt_package_and_secrets() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();

    let report = diagnose(&ctx);

    assert!(!report.has_errors(), "{:?}", categories(&report));
    let not_built: Vec<_> = report.in_category("not_built").collect();
    assert_eq!(not_built.len(), 1);
    assert!(not_built[0].description.contains("orchestrator"));
    assert_eq!(
        not_built[0].remediation.as_deref(),
        Some("voxdeploy build orchestrator")
    );

    let secrets: Vec<_> = report.in_category("secrets_missing").collect();
    assert_eq!(secrets.len(), 1);
    assert_eq!(
        secrets[0].path.as_deref(),
        Some("/run/secrets/orchestrator.env")
    );
    assert!(
        secrets[0]
            .remediation
            .as_deref()
            .unwrap()
            .contains("S3_SECRET_KEY")
    );
}

#[test]
fn test_missing_aux_file_is_an_error() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    std::fs::remove_file(project.path().join("orchestrator/tools.json")).unwrap();
    let ctx = DeployContext::resolve_from(project.path()).unwrap();

    let mut report = DoctorReport::new();
    check_package_sources(&ctx, &mut report);

    assert!(report.has_errors());
    assert_eq!(categories(&report), vec!["missing_aux_file"]);
}

#[test]
fn test_missing_source_is_an_error() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    std::fs::remove_dir_all(project.path().join("tool-handler")).unwrap();
    let ctx = DeployContext::resolve_from(project.path()).unwrap();

    let mut report = DoctorReport::new();
    check_package_sources(&ctx, &mut report);

    assert_eq!(categories(&report), vec!["missing_source"]);
}

#[test]
fn test_unit_lifecycle_missing_then_current_then_outdated() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();
    build_package(&ctx, "orchestrator").unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);
    assert_eq!(report.in_category("unit_missing").count(), 1);

    let Outcome::Compiled(unit) = compile_service(&ctx, "orchestrator").unwrap() else {
        panic!("orchestrator is enabled");
    };
    write_unit(&ctx, &unit).unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);
    assert_eq!(report.in_category("unit_missing").count(), 0);
    assert_eq!(report.in_category("unit_outdated").count(), 0);

    std::fs::write(ctx.unit_path("orchestrator.service"), "[Unit]\n").unwrap();
    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);
    assert_eq!(report.in_category("unit_outdated").count(), 1);
}

#[test]
fn test_artifact_missing_data_file_is_incomplete() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();
    let (artifact, _) = build_package(&ctx, "orchestrator").unwrap();
    std::fs::remove_file(artifact.data_dir().join("tools.json")).unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);

    let incomplete: Vec<_> = report.in_category("artifact_incomplete").collect();
    assert_eq!(incomplete.len(), 1);
    assert!(incomplete[0].path.as_deref().unwrap().ends_with("tools.json"));
    assert!(report.has_errors());
}

#[test]
fn test_relative_secrets_path_is_an_error() {
    let yaml = SAMPLE_DEPLOY_YAML.replace(
        "environmentFile: /run/secrets/orchestrator.env",
        "environmentFile: secrets/orchestrator.env",
    );
    let project = create_test_project(&yaml);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);

    assert_eq!(categories(&report), vec!["relative_path"]);
    assert!(report.issues[0].description.contains("environmentFile"));
    assert!(report.has_errors());
}

#[test]
fn test_disabled_service_with_unit_file_is_stale() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();
    std::fs::create_dir_all(&ctx.unit_dir).unwrap();
    std::fs::write(ctx.unit_path("tool-handler.service"), "[Unit]\n").unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);

    let stale: Vec<_> = report.in_category("stale_unit").collect();
    assert_eq!(stale.len(), 1);
    assert!(stale[0].description.contains("tool-handler"));
}

#[test]
fn test_bad_override_is_reported() {
    let yaml = r#"
services:
  orchestrator:
    variant: orchestrator
    package: ./artifact
    options:
      settings:
        llmModel: "qwen3:4b"
"#;
    let project = create_test_project(yaml);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();

    let mut report = DoctorReport::new();
    check_services(&ctx, &mut report);

    assert_eq!(categories(&report), vec!["unresolved_options"]);
    assert!(report.issues[0].description.contains("settings.llmModel"));
}

#[test]
fn test_corrupt_event_log_is_a_warning() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let ctx = DeployContext::resolve_from(project.path()).unwrap();
    std::fs::create_dir_all(&ctx.state_dir).unwrap();
    std::fs::write(ctx.events_file(), "{not json}\n").unwrap();

    let mut report = DoctorReport::new();
    check_event_log(&ctx, &mut report);

    assert_eq!(categories(&report), vec!["events_unreadable"]);
    assert!(!report.has_errors());
}

#[test]
#[serial]
fn test_cmd_doctor_warnings_only_succeeds() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    let _guard = DirGuard::new(project.path());

    cmd_doctor().unwrap();
}

#[test]
#[serial]
fn test_cmd_doctor_errors_fail() {
    let project = create_test_project(SAMPLE_DEPLOY_YAML);
    std::fs::remove_file(project.path().join("orchestrator/main.py")).unwrap();
    let _guard = DirGuard::new(project.path());

    let err = cmd_doctor().unwrap_err();
    assert!(matches!(err, VoxError::UserError(_)));
}
