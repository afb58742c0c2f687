//! Option path to environment variable naming.
//!
//! The variable names are the compatibility surface with the deployed
//! application: `settings.haUrl` must become `HA_URL`, `settings.mqttPort`
//! must become `MQTT_PORT`, and so on.

use crate::error::{Result, VoxError};
use crate::schema::Schema;
use std::collections::HashMap;

/// Namespace segment stripped from option paths before naming.
pub const SETTINGS_NAMESPACE: &str = "settings";

/// Maps an option path to an environment variable name.
pub trait NamingConvention {
    fn env_name(&self, path: &str) -> String;
}

/// Upper-snake-case naming.
///
/// Drops a leading `settings` segment, splits camelCase words, joins every
/// word with `_` and upper-cases the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperSnake;

impl NamingConvention for UpperSnake {
    fn env_name(&self, path: &str) -> String {
        let mut segments = path.split('.').peekable();
        if segments.peek() == Some(&SETTINGS_NAMESPACE) {
            segments.next();
        }

        let words: Vec<String> = segments.flat_map(split_camel_case).collect();
        words.join("_").to_uppercase()
    }
}

impl<F> NamingConvention for F
where
    F: Fn(&str) -> String,
{
    fn env_name(&self, path: &str) -> String {
        self(path)
    }
}

/// Split `speakerIdPort` into `speaker`, `Id`, `Port`.
///
/// Digits stay attached to the preceding word (`s3Bucket` -> `s3`, `Bucket`).
fn split_camel_case(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in segment.chars() {
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Verify that no two of `paths` map to the same variable name.
pub fn check_injective<'a>(
    paths: impl IntoIterator<Item = &'a str>,
    naming: &dyn NamingConvention,
) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for path in paths {
        let name = naming.env_name(path);
        if let Some(previous) = seen.insert(name.clone(), path) {
            return Err(VoxError::Compile(format!(
                "options '{}' and '{}' both map to environment variable {}",
                previous, path, name
            )));
        }
    }

    Ok(())
}

/// Paths of every option in `schema`, for [`check_injective`].
pub fn schema_paths(schema: &Schema) -> impl Iterator<Item = &str> {
    schema.options().iter().map(|o| o.path.as_str())
}
