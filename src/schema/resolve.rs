//! Resolution of a schema against operator overrides.

use super::model::{Schema, SettingsRecord};
use super::types::OptionValue;
use crate::error::{Result, VoxError};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Operator-supplied values keyed by dotted option path.
pub type Overrides = BTreeMap<String, OptionValue>;

/// Resolve every option of `schema` against `overrides`.
///
/// Each path takes its override when present and type-compatible, otherwise
/// its default. An override with the wrong type, or for a path the schema
/// does not declare, fails the whole resolution; no partial record is
/// returned.
pub fn resolve(schema: &Schema, overrides: &Overrides) -> Result<SettingsRecord> {
    if let Some(unknown) = overrides.keys().find(|path| schema.get(path).is_none()) {
        let actual = &overrides[unknown];
        return Err(VoxError::resolution(
            unknown.as_str(),
            "a declared option",
            format!("undeclared option with {} value", actual.kind()),
        ));
    }

    let mut entries = Vec::with_capacity(schema.len());

    for option in schema.options() {
        let value = match overrides.get(&option.path) {
            Some(value) => value.coerce_to(option.kind).ok_or_else(|| {
                VoxError::resolution(option.path.as_str(), option.kind, value.kind())
            })?,
            None => option.default.clone(),
        };
        entries.push((option.path.clone(), value));
    }

    tracing::debug!(
        options = entries.len(),
        overridden = overrides.len(),
        "resolved settings record"
    );

    Ok(SettingsRecord { entries })
}

/// Flatten a YAML override document into dotted-path overrides.
///
/// Nested mappings become dotted paths (`settings: {mqttPort: 8001}` yields
/// `settings.mqttPort`). Scalars map onto option values; `null` is the
/// explicit absent value. Sequences, non-string keys and a second value for
/// the same dotted path are rejected.
pub fn overrides_from_yaml(value: &Value) -> Result<Overrides> {
    let mut overrides = Overrides::new();
    match value {
        Value::Null => {}
        Value::Mapping(_) => flatten_into(value, "", &mut overrides)?,
        other => {
            return Err(VoxError::UserError(format!(
                "option overrides must be a mapping, found {}",
                yaml_kind(other)
            )));
        }
    }
    Ok(overrides)
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Overrides) -> Result<()> {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = key.as_str().ok_or_else(|| {
                    VoxError::UserError(format!(
                        "option override keys must be strings (under '{}')",
                        display_prefix(prefix)
                    ))
                })?;
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out)?;
            }
            Ok(())
        }
        Value::Tagged(tagged) => flatten_into(&tagged.value, prefix, out),
        scalar => {
            let option_value = scalar_to_value(scalar, prefix)?;
            if out.insert(prefix.to_string(), option_value).is_some() {
                return Err(VoxError::UserError(format!(
                    "option '{}' is overridden more than once",
                    prefix
                )));
            }
            Ok(())
        }
    }
}

fn scalar_to_value(value: &Value, path: &str) -> Result<OptionValue> {
    match value {
        Value::Null => Ok(OptionValue::ABSENT),
        Value::Bool(b) => Ok(OptionValue::Bool(*b)),
        Value::String(s) => Ok(OptionValue::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(OptionValue::Int)
            .ok_or_else(|| VoxError::resolution(path, "int", format!("number {}", n))),
        other => Err(VoxError::resolution(
            path,
            "a scalar value",
            yaml_kind(other),
        )),
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "<root>" } else { prefix }
}
