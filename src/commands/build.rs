//! Implementation of the `voxdeploy build` command.
//!
//! Builds declared packages into the content-addressed store. A package
//! whose inputs are unchanged resolves to the artifact already installed,
//! so re-running is cheap and never rewrites the store.

use crate::build::{Artifact, BuildPlan};
use crate::cli::BuildArgs;
use crate::context::DeployContext;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use serde_json::json;

/// Execute the `voxdeploy build` command.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
    let ctx = DeployContext::resolve()?;

    let names: Vec<String> = match args.package {
        Some(name) => {
            ctx.config.package(&name)?;
            vec![name]
        }
        None => ctx.config.packages.keys().cloned().collect(),
    };

    if names.is_empty() {
        println!("No packages declared in {}.", ctx.config_path().display());
        return Ok(());
    }

    for name in &names {
        let (artifact, reused) = build_package(&ctx, name)?;
        println!(
            "{} {} -> {}",
            if reused { "Reused" } else { "Built" },
            name,
            artifact.path.display()
        );
    }

    Ok(())
}

/// Build one declared package, returning the artifact and whether it was
/// already in the store.
pub(crate) fn build_package(ctx: &DeployContext, name: &str) -> Result<(Artifact, bool)> {
    let descriptor = ctx
        .config
        .package(name)?
        .to_descriptor(name, &ctx.project_root)?;

    let plan = BuildPlan::new(&descriptor)?;
    let id = plan.id().to_string();

    let (artifact, reused) = match plan.installed_in(&ctx.store_dir)? {
        Some(existing) => (existing, true),
        None => (plan.stage(&ctx.store_dir)?.install()?, false),
    };

    let event = Event::new(EventAction::Build)
        .with_subject(name)
        .with_details(json!({
            "id": id,
            "path": artifact.path.display().to_string(),
            "dependencies": artifact.manifest.dependencies,
            "reused": reused,
        }));
    append_event(ctx, &event)?;

    tracing::info!(package = %name, id = %id, reused, "package ready");
    Ok((artifact, reused))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoxError;
    use crate::events::read_events;
    use crate::test_support::{DirGuard, SAMPLE_DEPLOY_YAML, create_test_project};
    use serial_test::serial;

    #[test]
    fn test_build_package_installs_then_reuses() {
        let project = create_test_project(SAMPLE_DEPLOY_YAML);
        let ctx = DeployContext::resolve_from(project.path()).unwrap();

        let (first, reused) = build_package(&ctx, "orchestrator").unwrap();
        assert!(!reused);
        assert!(first.path.starts_with(&ctx.store_dir));
        assert!(first.executable().is_file());

        let (second, reused) = build_package(&ctx, "orchestrator").unwrap();
        assert!(reused);
        assert_eq!(first.path, second.path);
        assert_eq!(first.manifest.id, second.manifest.id);

        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.action == EventAction::Build));
        assert_eq!(events[1].details["reused"], true);
    }

    #[test]
    fn test_build_missing_aux_file_leaves_store_empty() {
        let project = create_test_project(SAMPLE_DEPLOY_YAML);
        std::fs::remove_file(project.path().join("tool-handler/tools.json")).unwrap();
        let ctx = DeployContext::resolve_from(project.path()).unwrap();

        let err = build_package(&ctx, "tool-handler").unwrap_err();
        assert!(matches!(err, VoxError::Build(_)));
        assert!(err.to_string().contains("tools.json"));

        let leftovers: Vec<_> = std::fs::read_dir(&ctx.store_dir)
            .map(|entries| entries.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty(), "store not empty: {:?}", leftovers);
        assert!(read_events(&ctx).unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn test_cmd_build_all_packages() {
        let project = create_test_project(SAMPLE_DEPLOY_YAML);
        let _guard = DirGuard::new(project.path());

        cmd_build(BuildArgs { package: None }).unwrap();

        let ctx = DeployContext::resolve().unwrap();
        let installed = std::fs::read_dir(&ctx.store_dir).unwrap().count();
        assert_eq!(installed, 2);
    }

    #[test]
    #[serial]
    fn test_cmd_build_unknown_package() {
        let project = create_test_project(SAMPLE_DEPLOY_YAML);
        let _guard = DirGuard::new(project.path());

        let err = cmd_build(BuildArgs {
            package: Some("speaker".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, VoxError::UserError(_)));
    }
}
