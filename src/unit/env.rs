//! Environment maps projected from settings records.

use crate::naming::NamingConvention;
use crate::schema::SettingsRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Variable forcing the application to flush its logs synchronously.
pub const UNBUFFERED_OUTPUT_VAR: &str = "PYTHONUNBUFFERED";

/// Ordered mapping from variable name to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvironmentMap(BTreeMap<String, String>);

impl EnvironmentMap {
    /// Project every entry of `settings` through `naming`.
    ///
    /// Absent paths produce no variable.
    pub fn from_settings(settings: &SettingsRecord, naming: &dyn NamingConvention) -> Self {
        let vars = settings
            .iter()
            .filter_map(|(path, value)| {
                value
                    .to_env_string()
                    .map(|v| (naming.env_name(path), v))
            })
            .collect();
        Self(vars)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
