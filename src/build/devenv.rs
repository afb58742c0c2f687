//! Development and CI shell environments.
//!
//! Every profile carries the package's dependency set unchanged, so what is
//! developed and tested against is exactly what gets deployed. Profiles only
//! add tooling on top.

use super::descriptor::BuildDescriptor;
use crate::unit::UNBUFFERED_OUTPUT_VAR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shell environment flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DevProfile {
    /// Interpreter and dependencies.
    #[default]
    Default,
    /// Adds packaging tooling on top of the default profile.
    Packaging,
    /// Adds the test runner and marks the shell as CI.
    Ci,
}

impl fmt::Display for DevProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevProfile::Default => write!(f, "default"),
            DevProfile::Packaging => write!(f, "packaging"),
            DevProfile::Ci => write!(f, "ci"),
        }
    }
}

/// A reproducible shell environment description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevEnvironment {
    pub package: String,
    pub profile: DevProfile,
    pub interpreter: String,
    /// The package's dependency pins, identical to the build's.
    pub dependencies: Vec<String>,
    /// Extra tools this profile adds.
    pub tools: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl DevEnvironment {
    pub fn for_profile(descriptor: &BuildDescriptor, profile: DevProfile) -> Self {
        let tools: Vec<String> = match profile {
            DevProfile::Default => vec![],
            DevProfile::Packaging => vec!["build".to_string(), "pip".to_string(), "wheel".to_string()],
            DevProfile::Ci => vec!["pytest".to_string(), "ruff".to_string()],
        };

        let mut env = BTreeMap::new();
        env.insert(UNBUFFERED_OUTPUT_VAR.to_string(), "1".to_string());
        env.insert("VOXDEPLOY_PACKAGE".to_string(), descriptor.name.clone());
        if profile == DevProfile::Ci {
            env.insert("CI".to_string(), "true".to_string());
        }

        Self {
            package: descriptor.name.clone(),
            profile,
            interpreter: descriptor.interpreter.clone(),
            dependencies: descriptor.dependencies.pins(),
            tools,
            env,
        }
    }

    /// Render a sourceable POSIX shell snippet.
    pub fn to_shell(&self) -> String {
        let mut out = format!("# voxdeploy {} shell for {}\n", self.profile, self.package);
        for (key, value) in &self.env {
            out.push_str(&format!("export {}={}\n", key, shell_words::quote(value)));
        }
        let requirements: Vec<String> = self
            .dependencies
            .iter()
            .chain(self.tools.iter())
            .map(|r| shell_words::quote(r).into_owned())
            .collect();
        if !requirements.is_empty() {
            out.push_str(&format!(
                "{} -m pip install {}\n",
                shell_words::quote(&self.interpreter),
                requirements.join(" ")
            ));
        }
        out
    }
}
