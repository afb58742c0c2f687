//! Package build descriptors and dependency sets.

use crate::error::{Result, VoxError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Regex pattern for `name==version` dependency pins.
static PIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)==([A-Za-z0-9][A-Za-z0-9.+_-]*)$")
        .expect("Invalid dependency pin regex")
});

/// Regex pattern for binary names (single path component, no spaces).
static BINARY_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("Invalid binary regex"));

/// One pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

/// The dependency closure of a package.
///
/// Declared once and shared by the production build and every development
/// environment. Pins are kept sorted and de-duplicated so equal sets compare
/// and hash equal regardless of declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet(BTreeSet<Dependency>);

impl DependencySet {
    /// Parse `name==version` pins.
    ///
    /// Names are compared case-insensitively; declaring one name at two
    /// versions is a build error.
    pub fn parse<S: AsRef<str>>(pins: &[S]) -> Result<Self> {
        let mut set = BTreeSet::new();
        for pin in pins {
            let pin = pin.as_ref().trim();
            let caps = PIN_REGEX.captures(pin).ok_or_else(|| {
                VoxError::Build(format!(
                    "invalid dependency pin '{}': expected 'name==version'",
                    pin
                ))
            })?;
            let dep = Dependency {
                name: caps[1].to_lowercase(),
                version: caps[2].to_string(),
            };
            if let Some(existing) = set
                .iter()
                .find(|d: &&Dependency| d.name == dep.name && d.version != dep.version)
            {
                return Err(VoxError::Build(format!(
                    "dependency '{}' is pinned twice ({} and {})",
                    dep.name, existing.version, dep.version
                )));
            }
            set.insert(dep);
        }
        Ok(Self(set))
    }

    /// Pins in canonical order.
    pub fn pins(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when no dependency name appears in both sets.
    #[cfg(test)]
    pub fn is_disjoint(&self, other: &DependencySet) -> bool {
        !self
            .0
            .iter()
            .any(|a| other.0.iter().any(|b| a.name == b.name))
    }
}

/// A fixed post-build step, run in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum PostBuildStep {
    /// Copy a source-tree file into the artifact's data directory.
    CopyAuxFile { file: String },
    /// Delete installed library files matching any of the globs.
    RemoveFixtures { globs: Vec<String> },
}

/// Everything needed to produce one installable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    /// Package name, used for the store path and data directory.
    pub name: String,
    /// Root of the source tree.
    pub source: PathBuf,
    /// Entry-point name under `bin/`.
    pub binary: String,
    /// Script launched by the entry point, relative to the source root.
    pub entry_point: String,
    /// Interpreter that runs the entry point.
    pub interpreter: String,
    pub dependencies: DependencySet,
    pub post_build: Vec<PostBuildStep>,
}

impl BuildDescriptor {
    /// The standard post-build sequence: copy `aux_file`, then strip fixtures.
    pub fn standard_post_build(aux_file: &str, fixture_globs: &[String]) -> Vec<PostBuildStep> {
        vec![
            PostBuildStep::CopyAuxFile {
                file: aux_file.to_string(),
            },
            PostBuildStep::RemoveFixtures {
                globs: fixture_globs.to_vec(),
            },
        ]
    }

    /// Check names that end up in filesystem paths or the launcher.
    pub fn validate(&self) -> Result<()> {
        for (what, value) in [("package name", &self.name), ("binary name", &self.binary)] {
            if !BINARY_NAME_REGEX.is_match(value) {
                return Err(VoxError::Build(format!(
                    "invalid {} '{}': use letters, digits, '.', '_' or '-'",
                    what, value
                )));
            }
        }

        if self.entry_point.is_empty()
            || self.entry_point.starts_with('/')
            || self.entry_point.split('/').any(|c| c == "..")
        {
            return Err(VoxError::Build(format!(
                "entry point '{}' must be a relative path inside the source tree",
                self.entry_point
            )));
        }

        if self.interpreter.trim().is_empty() {
            return Err(VoxError::Build("interpreter must not be empty".to_string()));
        }

        Ok(())
    }

    /// The auxiliary data file named by the post-build steps, if any.
    pub fn aux_file(&self) -> Option<&str> {
        self.post_build.iter().find_map(|step| match step {
            PostBuildStep::CopyAuxFile { file } => Some(file.as_str()),
            PostBuildStep::RemoveFixtures { .. } => None,
        })
    }
}
