//! Event logging for voxdeploy.
//!
//! Builds and compiles append one record each to an NDJSON audit log
//! (one JSON object per line) at `<state_dir>/events.ndjson`.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (init, build, compile, skip)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `subject`: Optional package or service name
//! - `details`: Freeform object with action-specific details
//!
//! Details carry artifact ids, store paths and environment variable names.
//! Secrets are never read, so they cannot be logged.
//!
//! ```no_run
//! use voxdeploy::context::DeployContext;
//! use voxdeploy::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let ctx = DeployContext::resolve()?;
//! let event = Event::new(EventAction::Skip)
//!     .with_subject("tool-handler")
//!     .with_details(json!({"reason": "disabled"}));
//! append_event(&ctx, &event)?;
//! # Ok::<(), voxdeploy::error::VoxError>(())
//! ```

use crate::context::DeployContext;
use crate::error::{Result, VoxError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Project initialized
    Init,
    /// Artifact built (or reused from the store)
    Build,
    /// Unit file rendered for an enabled service
    Compile,
    /// Disabled service produced no unit
    Skip,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::Build => write!(f, "build"),
            EventAction::Compile => write!(f, "compile"),
            EventAction::Skip => write!(f, "skip"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// Who ran the command (`user@HOST`).
    pub actor: String,

    /// Package or service the event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            subject: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| VoxError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the project's event log, creating it if needed.
pub fn append_event(ctx: &DeployContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();
    let json_line = event.to_ndjson_line()?;

    fs::create_dir_all(&ctx.state_dir).map_err(|e| {
        VoxError::UserError(format!(
            "failed to create state directory '{}': {}",
            ctx.state_dir.display(),
            e
        ))
    })?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            VoxError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        VoxError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        VoxError::UserError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event in the log, oldest first. A missing log reads as empty.
pub fn read_events(ctx: &DeployContext) -> Result<Vec<Event>> {
    let events_file = ctx.events_file();
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&events_file).map_err(|e| {
        VoxError::UserError(format!(
            "failed to read events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                VoxError::UserError(format!(
                    "malformed event on line {} of '{}': {}",
                    i + 1,
                    events_file.display(),
                    e
                ))
            })
        })
        .collect()
}
