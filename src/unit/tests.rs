//! Tests for the deployment compiler.

use crate::error::VoxError;
use crate::naming::UpperSnake;
use crate::schema::{OptionSpec, OptionValue, Overrides, define_schema, resolve};
use crate::test_support::install_artifact;
use crate::unit::{ServiceDescriptor, UNBUFFERED_OUTPUT_VAR, compile};
use crate::variants::ServiceVariant;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn descriptor_for(
    variant: ServiceVariant,
    overrides: Overrides,
    package: PathBuf,
) -> ServiceDescriptor {
    let schema = variant.schema().unwrap();
    let record = resolve(&schema, &overrides).unwrap();
    ServiceDescriptor::from_record(variant.name(), variant, &record, package, vec![]).unwrap()
}

fn enabled() -> Overrides {
    let mut overrides = Overrides::new();
    overrides.insert("enable".to_string(), OptionValue::Bool(true));
    overrides
}

fn orchestrator_artifact(root: &Path) -> PathBuf {
    install_artifact(root, "orchestrator", "voice-orchestrator", &["paho-mqtt==2.1.0"]).path
}

#[test]
fn test_disabled_descriptor_emits_no_unit() {
    // Package does not even exist: disabled services are never resolved.
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        Overrides::new(),
        PathBuf::from("/nonexistent"),
    );
    assert!(!d.enabled);
    assert_eq!(compile(&d, &UpperSnake).unwrap(), None);
}

#[test]
fn test_unresolved_package_is_a_compile_error() {
    let temp = TempDir::new().unwrap();
    let d = descriptor_for(ServiceVariant::Orchestrator, enabled(), temp.path().join("missing"));

    let err = compile(&d, &UpperSnake).unwrap_err();
    assert!(matches!(err, VoxError::Compile(_)));
    assert!(err.to_string().contains("orchestrator"));
}

#[test]
fn test_wrong_binary_is_a_compile_error() {
    let temp = TempDir::new().unwrap();
    let artifact = orchestrator_artifact(temp.path());
    let mut d = descriptor_for(ServiceVariant::Orchestrator, enabled(), artifact);
    d.binary = "voice-tool-handler".to_string();

    let err = compile(&d, &UpperSnake).unwrap_err();
    assert!(err.to_string().contains("voice-tool-handler"));
}

#[test]
fn test_compiled_unit_runs_artifact_binary() {
    let temp = TempDir::new().unwrap();
    let artifact = orchestrator_artifact(temp.path());
    let d = descriptor_for(ServiceVariant::Orchestrator, enabled(), artifact.clone());

    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert_eq!(unit.exec_start, artifact.join("bin/voice-orchestrator"));
    assert_eq!(unit.file_name(), "orchestrator.service");
}

#[test]
fn test_mqtt_port_override_is_serialized_as_decimal() {
    let temp = TempDir::new().unwrap();
    let mut overrides = enabled();
    overrides.insert("settings.mqttPort".to_string(), OptionValue::Int(8001));
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        overrides,
        orchestrator_artifact(temp.path()),
    );

    assert_eq!(d.settings.get("settings.mqttPort"), Some(&OptionValue::Int(8001)));
    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert_eq!(unit.environment.get("MQTT_PORT"), Some("8001"));
}

#[test]
fn test_llm_auth_required_defaults_to_false() {
    let temp = TempDir::new().unwrap();
    let artifact =
        install_artifact(temp.path(), "tool-handler", "voice-tool-handler", &["openai==1.30.0"]);
    let d = descriptor_for(ServiceVariant::ToolHandler, enabled(), artifact.path);

    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert_eq!(unit.environment.get("LLM_AUTH_REQUIRED"), Some("false"));
    assert_eq!(unit.environment.get("HA_URL"), Some("http://homeassistant.local:8123"));
    assert_eq!(unit.environment.get("LLM_MODEL"), Some("qwen3:1.7b"));
}

#[test]
fn test_environment_has_only_settings_and_unbuffered_flag() {
    let temp = TempDir::new().unwrap();
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        enabled(),
        orchestrator_artifact(temp.path()),
    );
    let unit = compile(&d, &UpperSnake).unwrap().unwrap();

    assert_eq!(unit.environment.get(UNBUFFERED_OUTPUT_VAR), Some("1"));
    assert!(!unit.environment.contains("ENABLE"));
    assert!(!unit.environment.contains("ENVIRONMENT_FILE"));
    assert_eq!(unit.environment.len(), d.settings.len() + 1);
    assert!(unit.environment.contains("SPEAKER_ID_PORT"));
    assert!(unit.environment.contains("WHISPER_PORT"));
}

#[test]
fn test_secrets_are_referenced_never_inlined() {
    let temp = TempDir::new().unwrap();
    let secrets_path = temp.path().join("orchestrator.env");
    std::fs::write(
        &secrets_path,
        "S3_SECRET_KEY=super-secret-value\nHA_TOKEN=token-abc123\n",
    )
    .unwrap();

    let mut overrides = enabled();
    overrides.insert(
        "environmentFile".to_string(),
        OptionValue::path(&secrets_path),
    );
    let schema = ServiceVariant::Orchestrator.schema().unwrap();
    let record = resolve(&schema, &overrides).unwrap();
    let d = ServiceDescriptor::from_record(
        "orchestrator",
        ServiceVariant::Orchestrator,
        &record,
        orchestrator_artifact(temp.path()),
        vec![],
    )
    .unwrap();

    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    let rendered = unit.render();
    let json = serde_json::to_string(&unit).unwrap();
    let record_dump = format!("{:?}", record);

    for secret in ["super-secret-value", "token-abc123", "S3_SECRET_KEY", "HA_TOKEN"] {
        assert!(!rendered.contains(secret), "unit text leaked {}", secret);
        assert!(!json.contains(secret), "unit json leaked {}", secret);
        assert!(!record_dump.contains(secret), "record leaked {}", secret);
        assert!(unit.environment.iter().all(|(k, v)| k != secret && v != secret));
    }
    assert!(rendered.contains(&format!("EnvironmentFile={}\n", secrets_path.display())));
}

#[test]
fn test_missing_secrets_file_still_compiles() {
    let temp = TempDir::new().unwrap();
    let mut overrides = enabled();
    overrides.insert(
        "environmentFile".to_string(),
        OptionValue::path("/run/secrets/not-yet-there.env"),
    );
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        overrides,
        orchestrator_artifact(temp.path()),
    );
    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert!(unit.environment_file.is_some());
}

#[test]
fn test_compilation_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let artifact = orchestrator_artifact(temp.path());
    let mut overrides = enabled();
    overrides.insert("settings.mqttHost".to_string(), OptionValue::string("broker.lan"));

    let a = compile(
        &descriptor_for(ServiceVariant::Orchestrator, overrides.clone(), artifact.clone()),
        &UpperSnake,
    )
    .unwrap()
    .unwrap();
    let b = compile(
        &descriptor_for(ServiceVariant::Orchestrator, overrides, artifact),
        &UpperSnake,
    )
    .unwrap()
    .unwrap();

    assert_eq!(a.environment, b.environment);
    assert_eq!(a.render(), b.render());
}

#[test]
fn test_rendered_unit_carries_sandbox_and_ordering() {
    let temp = TempDir::new().unwrap();
    let schema = ServiceVariant::Orchestrator.schema().unwrap();
    let record = resolve(&schema, &enabled()).unwrap();
    let d = ServiceDescriptor::from_record(
        "orchestrator",
        ServiceVariant::Orchestrator,
        &record,
        orchestrator_artifact(temp.path()),
        vec!["mosquitto.service".to_string(), "network-online.target".to_string()],
    )
    .unwrap();

    let text = compile(&d, &UpperSnake).unwrap().unwrap().render();

    for line in [
        "[Unit]\n",
        "Description=Voice assistant orchestrator\n",
        "After=network-online.target mosquitto.service\n",
        "DynamicUser=yes\n",
        "ProtectSystem=strict\n",
        "ProtectHome=yes\n",
        "PrivateTmp=yes\n",
        "Environment=\"PYTHONUNBUFFERED=1\"\n",
        "Environment=\"MQTT_PORT=1883\"\n",
        "Restart=on-failure\n",
        "WantedBy=multi-user.target\n",
    ] {
        assert!(text.contains(line), "missing {:?} in:\n{}", line, text);
    }
    assert!(!text.contains("EnvironmentFile="));
}

#[test]
fn test_colliding_settings_are_rejected() {
    let temp = TempDir::new().unwrap();
    let schema = define_schema(vec![
        OptionSpec::bool("enable", true, "on"),
        OptionSpec::int("settings.mqttPort", 1883, "a"),
        OptionSpec::int("settings.mqtt.port", 1883, "b"),
    ])
    .unwrap();
    let record = resolve(&schema, &Overrides::new()).unwrap();
    let d = ServiceDescriptor::from_record(
        "orchestrator",
        ServiceVariant::Orchestrator,
        &record,
        orchestrator_artifact(temp.path()),
        vec![],
    )
    .unwrap();

    let err = compile(&d, &UpperSnake).unwrap_err();
    assert!(matches!(err, VoxError::Compile(_)));
    assert!(err.to_string().contains("MQTT_PORT"));
}

#[test]
fn test_two_variants_compile_to_independent_units() {
    let temp = TempDir::new().unwrap();
    let orch_schema = define_schema(vec![
        OptionSpec::bool("enable", true, "on"),
        OptionSpec::int("settings.mqttPort", 1883, "broker port"),
        OptionSpec::int("settings.whisperPort", 10300, "stt port"),
    ])
    .unwrap();
    let tool_schema = define_schema(vec![
        OptionSpec::bool("enable", true, "on"),
        OptionSpec::string("settings.haUrl", "http://ha:8123", "ha"),
        OptionSpec::string("settings.llmModel", "qwen3:1.7b", "model"),
    ])
    .unwrap();

    let orch_artifact =
        install_artifact(temp.path(), "orchestrator", "voice-orchestrator", &["paho-mqtt==2.1.0"]);
    let tool_artifact =
        install_artifact(temp.path(), "tool-handler", "voice-tool-handler", &["openai==1.30.0"]);

    let orch = ServiceDescriptor::from_record(
        "orchestrator",
        ServiceVariant::Orchestrator,
        &resolve(&orch_schema, &Overrides::new()).unwrap(),
        orch_artifact.path,
        vec![],
    )
    .unwrap();
    let tool = ServiceDescriptor::from_record(
        "tool-handler",
        ServiceVariant::ToolHandler,
        &resolve(&tool_schema, &Overrides::new()).unwrap(),
        tool_artifact.path,
        vec![],
    )
    .unwrap();

    let orch_unit = compile(&orch, &UpperSnake).unwrap().unwrap();
    let tool_unit = compile(&tool, &UpperSnake).unwrap().unwrap();

    assert_ne!(orch_unit.exec_start, tool_unit.exec_start);
    let shared: Vec<&str> = orch_unit
        .environment
        .keys()
        .filter(|k| *k != UNBUFFERED_OUTPUT_VAR && tool_unit.environment.contains(k))
        .collect();
    assert!(shared.is_empty(), "shared variables: {:?}", shared);
}

#[test]
fn test_absent_optional_path_setting_is_not_exported() {
    let temp = TempDir::new().unwrap();
    let schema = define_schema(vec![
        OptionSpec::bool("enable", true, "on"),
        OptionSpec::optional_path("settings.toolsFile", "override tools.json"),
    ])
    .unwrap();
    let record = resolve(&schema, &Overrides::new()).unwrap();
    let d = ServiceDescriptor::from_record(
        "orchestrator",
        ServiceVariant::Orchestrator,
        &record,
        orchestrator_artifact(temp.path()),
        vec![],
    )
    .unwrap();

    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert!(!unit.environment.contains("TOOLS_FILE"));
}

#[test]
fn test_state_directory_is_named_after_the_service() {
    let temp = TempDir::new().unwrap();
    let mut d = descriptor_for(
        ServiceVariant::Orchestrator,
        enabled(),
        orchestrator_artifact(temp.path()),
    );
    d.read_write_paths = vec![PathBuf::from("/var/cache/voice")];
    d.state_directory = true;

    let unit = compile(&d, &UpperSnake).unwrap().unwrap();
    assert_eq!(unit.sandbox.state_directory.as_deref(), Some("orchestrator"));

    let text = unit.render();
    assert!(text.contains("StateDirectory=orchestrator\n"));
    assert!(text.contains("ReadWritePaths=/var/cache/voice\n"));
}

#[test]
fn test_relative_secrets_path_is_a_compile_error() {
    let temp = TempDir::new().unwrap();
    let mut overrides = enabled();
    overrides.insert(
        "environmentFile".to_string(),
        OptionValue::path("secrets/orchestrator.env"),
    );
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        overrides,
        orchestrator_artifact(temp.path()),
    );

    let err = compile(&d, &UpperSnake).unwrap_err();
    assert!(matches!(err, VoxError::Compile(_)));
    assert!(err.to_string().contains("environmentFile"));
    assert!(err.to_string().contains("secrets/orchestrator.env"));
}

#[test]
fn test_relative_read_write_path_is_a_compile_error() {
    let temp = TempDir::new().unwrap();
    let mut d = descriptor_for(
        ServiceVariant::Orchestrator,
        enabled(),
        orchestrator_artifact(temp.path()),
    );
    d.read_write_paths = vec![PathBuf::from("/var/cache/voice"), PathBuf::from("data")];

    let err = compile(&d, &UpperSnake).unwrap_err();
    assert!(matches!(err, VoxError::Compile(_)));
    assert!(err.to_string().contains("read_write_paths"));
    assert!(err.to_string().contains("'data'"));
}

#[test]
fn test_disabled_descriptor_with_relative_paths_emits_no_unit() {
    let mut overrides = Overrides::new();
    overrides.insert(
        "environmentFile".to_string(),
        OptionValue::path("secrets/orchestrator.env"),
    );
    let d = descriptor_for(
        ServiceVariant::Orchestrator,
        overrides,
        PathBuf::from("/nonexistent"),
    );
    assert_eq!(compile(&d, &UpperSnake).unwrap(), None);
}
