//! Audit log for cf-plex.
//!
//! Store mutations and dispatch runs are appended to `events.ndjson` in the
//! store root, one JSON object per line:
//! - `ts`: RFC3339 timestamp
//! - `action`: `target_add`, `target_remove` or `dispatch`
//! - `actor`: `user@HOST`
//! - `target`: endpoint, for single-target events
//! - `details`: action-specific object
//!
//! Argument vectors are recorded in redacted form only. Writing the log is
//! best-effort from the caller's point of view: see [`record`].

use crate::context::PlexContext;
use crate::error::{PlexError, Result};
use crate::target::create_private_dir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Target added to the store
    TargetAdd,
    /// Target removed from the store
    TargetRemove,
    /// Wrapped command run across targets
    Dispatch,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::TargetAdd => write!(f, "target_add"),
            EventAction::TargetRemove => write!(f, "target_remove"),
            EventAction::Dispatch => write!(f, "dispatch"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    pub actor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            target: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_target(mut self, endpoint: impl Into<String>) -> Self {
        self.target = Some(endpoint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PlexError::UserError(format!("failed to serialize event to JSON: {}", e)))
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

/// Append an event as one line to `events_file`, creating it if needed.
pub fn append_event(events_file: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(dir) = events_file.parent() {
        if !dir.exists() {
            create_private_dir(dir)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(events_file)
        .map_err(|e| PlexError::io("open events file", events_file, e))?;

    writeln!(file, "{}", json_line)
        .map_err(|e| PlexError::io("write event to", events_file, e))?;

    Ok(())
}

/// Append an event if the audit log is enabled.
///
/// A failure to log never fails the command; it is reported as a warning.
pub fn record(ctx: &PlexContext, event: Event) {
    if !ctx.config.audit_log {
        return;
    }
    if let Err(e) = append_event(&ctx.events_path(), &event) {
        eprintln!("Warning: failed to log {} event: {}", event.action, e);
    }
}
