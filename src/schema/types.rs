//! Option types and values.
//!
//! Every option declares exactly one `OptionType`; every resolved value is an
//! `OptionValue` of the matching kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Declared type of a configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Free-form text (URLs, hostnames, model tags).
    String,
    /// Boolean flag.
    Bool,
    /// Signed integer (ports, limits).
    Int,
    /// Filesystem path that may be explicitly absent.
    OptionalPath,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::String => write!(f, "string"),
            OptionType::Bool => write!(f, "bool"),
            OptionType::Int => write!(f, "int"),
            OptionType::OptionalPath => write!(f, "optional path"),
        }
    }
}

/// A concrete option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Path(Option<PathBuf>),
    String(String),
}

impl OptionValue {
    /// The explicit "absent" value accepted by nullable path options.
    pub const ABSENT: OptionValue = OptionValue::Path(None);

    /// Shorthand for a string value.
    pub fn string(s: impl Into<String>) -> Self {
        OptionValue::String(s.into())
    }

    /// Shorthand for a present path value.
    pub fn path(p: impl Into<PathBuf>) -> Self {
        OptionValue::Path(Some(p.into()))
    }

    /// The runtime type of this value.
    pub fn kind(&self) -> OptionType {
        match self {
            OptionValue::String(_) => OptionType::String,
            OptionValue::Bool(_) => OptionType::Bool,
            OptionValue::Int(_) => OptionType::Int,
            OptionValue::Path(_) => OptionType::OptionalPath,
        }
    }

    /// Coerce this value to the declared type, or `None` if incompatible.
    ///
    /// A string is accepted where a path is declared (operators write paths
    /// as plain YAML strings); nothing else converts.
    pub fn coerce_to(&self, declared: OptionType) -> Option<OptionValue> {
        match (self, declared) {
            (OptionValue::String(s), OptionType::OptionalPath) => {
                Some(OptionValue::Path(Some(PathBuf::from(s))))
            }
            (value, declared) if value.kind() == declared => Some(value.clone()),
            _ => None,
        }
    }

    /// Serialize this value into environment-variable form.
    ///
    /// Returns `None` for an absent path; the variable is then left unset.
    pub fn to_env_string(&self) -> Option<String> {
        match self {
            OptionValue::String(s) => Some(s.clone()),
            OptionValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            OptionValue::Int(i) => Some(i.to_string()),
            OptionValue::Path(Some(p)) => Some(p.display().to_string()),
            OptionValue::Path(None) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{:?}", s),
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Path(Some(p)) => write!(f, "{}", p.display()),
            OptionValue::Path(None) => write!(f, "null"),
        }
    }
}
