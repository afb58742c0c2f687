//! Typed configuration schema.
//!
//! A schema is an ordered table of typed options with defaults. Resolving it
//! against operator overrides yields a `SettingsRecord` holding exactly one
//! value per declared path. Type mismatches fail resolution immediately.

mod diff;
mod model;
mod resolve;
pub mod types;


pub use diff::{DefaultChange, SchemaDiff, TypeChange};
pub use model::{OptionSpec, Schema, SettingsRecord, define_schema};
pub use resolve::{Overrides, overrides_from_yaml, resolve};
pub use types::{OptionType, OptionValue};
