//! Implementation of the `voxdeploy options` command.

use super::parse_variant;
use crate::cli::OptionsArgs;
use crate::error::{Result, VoxError};
use crate::naming::{NamingConvention, SETTINGS_NAMESPACE, UpperSnake};
use crate::schema::Schema;
use crate::variants::ServiceVariant;
use std::fmt::Write as _;

/// Execute the `voxdeploy options` command.
pub fn cmd_options(args: OptionsArgs) -> Result<()> {
    let variant = parse_variant(&args.variant)?;
    let schema = variant.schema()?;

    if args.json {
        let json = serde_json::to_string_pretty(&schema)
            .map_err(|e| VoxError::UserError(format!("failed to encode schema: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", format_options(variant, &schema, &UpperSnake));
    }

    Ok(())
}

/// One block per option, grouped by integration in declaration order.
fn format_options(variant: ServiceVariant, schema: &Schema, naming: &dyn NamingConvention) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} options)", variant.name(), schema.len());

    let mut current_group: Option<&str> = None;
    for option in schema.options() {
        if current_group != Some(option.group.as_str()) {
            let _ = writeln!(out, "\n[{}]", option.group);
            current_group = Some(option.group.as_str());
        }

        let _ = writeln!(
            out,
            "  {} : {} = {}",
            option.path, option.kind, option.default
        );
        if option.path.starts_with(&format!("{}.", SETTINGS_NAMESPACE)) {
            let _ = writeln!(out, "      env: {}", naming.env_name(&option.path));
        }
        if !option.description.is_empty() {
            let _ = writeln!(out, "      {}", option.description);
        }
    }

    let secrets = variant.secret_keys();
    if !secrets.is_empty() {
        let _ = writeln!(out, "\nSecrets (supplied through environmentFile):");
        for key in secrets {
            let _ = writeln!(out, "  {}", key);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lists_env_names_for_settings_only() {
        let variant = ServiceVariant::Orchestrator;
        let text = format_options(variant, &variant.schema().unwrap(), &UpperSnake);

        assert!(text.starts_with("orchestrator ("));
        assert!(text.contains("  settings.mqttPort : int = 1883\n      env: MQTT_PORT\n"));
        assert!(text.contains("  enable : bool = false\n"));
        assert!(!text.contains("env: ENABLE"));
        assert!(text.contains("[mqtt]"));
        assert!(text.contains("S3_SECRET_KEY"));
    }

    #[test]
    fn test_format_tool_handler_shows_auth_flag() {
        let variant = ServiceVariant::ToolHandler;
        let text = format_options(variant, &variant.schema().unwrap(), &UpperSnake);

        assert!(text.contains("settings.llmAuthRequired : bool = false"));
        assert!(text.contains("env: LLM_AUTH_REQUIRED"));
        assert!(text.contains("HA_TOKEN"));
    }

    #[test]
    fn test_unknown_variant_is_user_error() {
        let err = cmd_options(OptionsArgs {
            variant: "speaker-id".to_string(),
            json: false,
        })
        .unwrap_err();
        assert!(matches!(err, VoxError::UserError(_)));
    }
}
