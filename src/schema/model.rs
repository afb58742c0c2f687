//! Option declarations, schemas, and resolved settings records.

use super::types::{OptionType, OptionValue};
use crate::error::{Result, VoxError};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Regex pattern for valid option paths.
static OPTION_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*(\.[A-Za-z][A-Za-z0-9]*)*$")
        .expect("Invalid option path regex")
});

/// A single named, typed configuration field with a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    /// Dotted option path (e.g. `settings.mqttPort`).
    pub path: String,

    /// Declared type.
    #[serde(rename = "type")]
    pub kind: OptionType,

    /// Value used when no override is supplied.
    pub default: OptionValue,

    /// Human-readable description.
    pub description: String,

    /// External integration this option belongs to (e.g. "mqtt", "s3").
    pub group: String,
}

impl OptionSpec {
    pub fn string(path: &str, default: &str, description: &str) -> Self {
        Self::new(path, OptionType::String, OptionValue::string(default), description)
    }

    pub fn bool(path: &str, default: bool, description: &str) -> Self {
        Self::new(path, OptionType::Bool, OptionValue::Bool(default), description)
    }

    pub fn int(path: &str, default: i64, description: &str) -> Self {
        Self::new(path, OptionType::Int, OptionValue::Int(default), description)
    }

    /// A nullable path option defaulting to absent.
    pub fn optional_path(path: &str, description: &str) -> Self {
        Self::new(path, OptionType::OptionalPath, OptionValue::ABSENT, description)
    }

    pub fn new(path: &str, kind: OptionType, default: OptionValue, description: &str) -> Self {
        Self {
            path: path.to_string(),
            kind,
            default,
            description: description.to_string(),
            group: String::new(),
        }
    }

    /// Assign the integration group.
    pub fn in_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }
}

/// A validated, ordered set of option declarations.
///
/// Construct with [`define_schema`]; the invariants (unique paths,
/// well-formed paths, type-matching defaults) hold for every instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    options: Vec<OptionSpec>,
}

/// Build a schema from an ordered sequence of option declarations.
///
/// Fails with `VoxError::Schema` on a duplicate or malformed path, or on a
/// default whose type does not match the declared type.
pub fn define_schema(options: Vec<OptionSpec>) -> Result<Schema> {
    let mut seen = HashSet::new();

    for option in &options {
        if !OPTION_PATH_REGEX.is_match(&option.path) {
            return Err(VoxError::Schema(format!(
                "invalid option path '{}': expected dot-separated alphanumeric segments",
                option.path
            )));
        }

        if !seen.insert(option.path.as_str()) {
            return Err(VoxError::Schema(format!(
                "option '{}' is declared more than once",
                option.path
            )));
        }

        if option.default.kind() != option.kind {
            return Err(VoxError::Schema(format!(
                "option '{}' is declared as {} but its default {} is {}",
                option.path,
                option.kind,
                option.default,
                option.default.kind()
            )));
        }
    }

    Ok(Schema { options })
}

impl Schema {
    /// All declarations in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Look up a declaration by path.
    pub fn get(&self, path: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.path == path)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The options nested under `prefix` (e.g. `settings`).
    pub fn subset(&self, prefix: &str) -> Schema {
        let dotted = format!("{}.", prefix);
        Schema {
            options: self
                .options
                .iter()
                .filter(|o| o.path.starts_with(&dotted))
                .cloned()
                .collect(),
        }
    }

    /// The record obtained when nothing is overridden.
    pub fn defaults(&self) -> SettingsRecord {
        SettingsRecord {
            entries: self
                .options
                .iter()
                .map(|o| (o.path.clone(), o.default.clone()))
                .collect(),
        }
    }
}

/// Fully resolved mapping from option path to value, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsRecord {
    pub(crate) entries: Vec<(String, OptionValue)>,
}

impl SettingsRecord {
    pub fn get(&self, path: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Boolean value at `path`, if present and boolean.
    pub fn bool(&self, path: &str) -> Option<bool> {
        match self.get(path) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The entries nested under `prefix`, keeping full paths.
    pub fn subset(&self, prefix: &str) -> SettingsRecord {
        let dotted = format!("{}.", prefix);
        SettingsRecord {
            entries: self
                .entries
                .iter()
                .filter(|(p, _)| p.starts_with(&dotted))
                .cloned()
                .collect(),
        }
    }
}

impl Serialize for SettingsRecord {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, value) in &self.entries {
            map.serialize_entry(path, value)?;
        }
        map.end()
    }
}
