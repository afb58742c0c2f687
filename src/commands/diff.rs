//! Implementation of the `voxdeploy diff` command.

use super::parse_variant;
use crate::cli::DiffArgs;
use crate::error::Result;
use crate::schema::SchemaDiff;
use std::fmt::Write as _;

/// Execute the `voxdeploy diff` command.
///
/// Exits successfully whether or not the schemas differ; the diff is
/// informational.
pub fn cmd_diff(args: DiffArgs) -> Result<()> {
    let left = parse_variant(&args.left)?;
    let right = parse_variant(&args.right)?;

    let diff = left.schema()?.diff(&right.schema()?);
    print!("{}", format_diff(left.name(), right.name(), &diff));
    Ok(())
}

fn format_diff(left: &str, right: &str, diff: &SchemaDiff) -> String {
    let mut out = String::new();

    if diff.is_empty() {
        let _ = writeln!(out, "{} and {} declare identical options.", left, right);
        return out;
    }

    if !diff.only_left.is_empty() {
        let _ = writeln!(out, "Only in {}:", left);
        for path in &diff.only_left {
            let _ = writeln!(out, "  - {}", path);
        }
    }
    if !diff.only_right.is_empty() {
        let _ = writeln!(out, "Only in {}:", right);
        for path in &diff.only_right {
            let _ = writeln!(out, "  + {}", path);
        }
    }
    if !diff.type_changes.is_empty() {
        let _ = writeln!(out, "Type differs:");
        for change in &diff.type_changes {
            let _ = writeln!(out, "  ~ {}: {} vs {}", change.path, change.left, change.right);
        }
    }
    if !diff.default_changes.is_empty() {
        let _ = writeln!(out, "Default differs:");
        for change in &diff.default_changes {
            let _ = writeln!(out, "  ~ {}: {} vs {}", change.path, change.left, change.right);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::ServiceVariant;

    #[test]
    fn test_orchestrator_vs_tool_handler_surfaces_auth_flag() {
        let left = ServiceVariant::Orchestrator.schema().unwrap();
        let right = ServiceVariant::ToolHandler.schema().unwrap();

        let text = format_diff("orchestrator", "tool-handler", &left.diff(&right));

        assert!(text.contains("Only in tool-handler:\n"));
        assert!(text.contains("  + settings.llmAuthRequired\n"));
        assert!(text.contains("  - settings.mqttPort\n"));
        assert!(!text.contains("Type differs"));
    }

    #[test]
    fn test_identical_variants() {
        let schema = ServiceVariant::Monolith.schema().unwrap();
        let text = format_diff("monolith", "monolith", &schema.diff(&schema));
        assert_eq!(text, "monolith and monolith declare identical options.\n");
    }
}
