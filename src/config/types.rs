//! Configuration enums and default value functions.

use serde::{Deserialize, Serialize};

/// What happens to batch session directories once a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchRetention {
    /// Leave them on disk so the next run can reuse the session (default).
    #[default]
    Keep,
    /// Delete them after the run.
    Remove,
}

impl BatchRetention {
    /// Parse a retention policy from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "keep" => Some(Self::Keep),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Default wrapped executable.
pub const DEFAULT_EXECUTABLE: &str = "cf";

/// Default variable that tells the wrapped executable where its session lives.
pub const DEFAULT_SESSION_ENV: &str = "CF_HOME";

pub(super) fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

pub(super) fn default_session_env() -> String {
    DEFAULT_SESSION_ENV.to_string()
}

pub(super) fn default_true() -> bool {
    true
}
