//! Structural comparison of two schemas.
//!
//! Sibling service variants are expected to agree on the options they share;
//! the diff makes any drift between their option tables visible.

use super::model::{OptionSpec, Schema};
use super::types::{OptionType, OptionValue};
use serde::Serialize;

/// A shared option whose declared type differs between the two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeChange {
    pub path: String,
    pub left: OptionType,
    pub right: OptionType,
}

/// A shared option with the same type but a different default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultChange {
    pub path: String,
    pub left: OptionValue,
    pub right: OptionValue,
}

/// Differences between a left and a right schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    /// Paths declared only by the left schema.
    pub only_left: Vec<String>,
    /// Paths declared only by the right schema.
    pub only_right: Vec<String>,
    pub type_changes: Vec<TypeChange>,
    pub default_changes: Vec<DefaultChange>,
}

impl SchemaDiff {
    /// True when both schemas declare identical options.
    pub fn is_empty(&self) -> bool {
        self.only_left.is_empty()
            && self.only_right.is_empty()
            && self.type_changes.is_empty()
            && self.default_changes.is_empty()
    }
}

impl Schema {
    /// Compare this schema (left) against `other` (right).
    pub fn diff(&self, other: &Schema) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for left in self.options() {
            match other.get(&left.path) {
                None => diff.only_left.push(left.path.clone()),
                Some(right) => compare_shared(left, right, &mut diff),
            }
        }

        diff.only_right = other
            .options()
            .iter()
            .filter(|o| self.get(&o.path).is_none())
            .map(|o| o.path.clone())
            .collect();

        diff
    }
}

fn compare_shared(left: &OptionSpec, right: &OptionSpec, diff: &mut SchemaDiff) {
    if left.kind != right.kind {
        diff.type_changes.push(TypeChange {
            path: left.path.clone(),
            left: left.kind,
            right: right.kind,
        });
    } else if left.default != right.default {
        diff.default_changes.push(DefaultChange {
            path: left.path.clone(),
            left: left.default.clone(),
            right: right.default.clone(),
        });
    }
}
