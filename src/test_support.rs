use crate::build::{Artifact, BuildDescriptor, DependencySet, build};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Write a minimal application source tree with an entry point and tools.json.
pub(crate) fn write_source_tree(root: &Path) {
    std::fs::create_dir_all(root.join("tests")).unwrap();
    std::fs::write(root.join("main.py"), "print('hello')\n").unwrap();
    std::fs::write(root.join("tools.json"), "{\"tools\": []}\n").unwrap();
    std::fs::write(root.join("tests/test_main.py"), "def test(): pass\n").unwrap();
}

/// Build and install an artifact named `name` exposing `bin/<binary>`.
pub(crate) fn install_artifact(root: &Path, name: &str, binary: &str, pins: &[&str]) -> Artifact {
    let source = root.join("sources").join(name);
    write_source_tree(&source);
    let descriptor = BuildDescriptor {
        name: name.to_string(),
        source,
        binary: binary.to_string(),
        entry_point: "main.py".to_string(),
        interpreter: "python3".to_string(),
        dependencies: DependencySet::parse(pins).unwrap(),
        post_build: BuildDescriptor::standard_post_build("tools.json", &["tests/**".to_string()]),
    };
    build(&descriptor, &root.join("store")).unwrap()
}

/// A project directory with a deploy.yaml and source trees for two services.
pub(crate) fn create_test_project(deploy_yaml: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    write_source_tree(&path.join("orchestrator"));
    write_source_tree(&path.join("tool-handler"));
    std::fs::write(path.join(crate::config::CONFIG_FILE), deploy_yaml).unwrap();

    temp_dir
}

/// deploy.yaml declaring both services, orchestrator enabled.
pub(crate) const SAMPLE_DEPLOY_YAML: &str = r#"
packages:
  orchestrator:
    source: orchestrator
    binary: voice-orchestrator
    dependencies: ["paho-mqtt==2.1.0", "boto3==1.34.0"]
  tool-handler:
    source: tool-handler
    binary: voice-tool-handler
    dependencies: ["fastapi==0.111.0", "openai==1.30.0"]
services:
  orchestrator:
    variant: orchestrator
    package: orchestrator
    after: [mosquitto.service]
    options:
      enable: true
      environmentFile: /run/secrets/orchestrator.env
      settings:
        mqttPort: 8001
  tool-handler:
    variant: tool-handler
    package: tool-handler
    options:
      settings:
        llmModel: "qwen3:4b"
"#;
