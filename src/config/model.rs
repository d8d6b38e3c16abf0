//! Config struct definition and default implementation.

use super::types::*;
use crate::coords::Separators;
use serde::{Deserialize, Serialize};

/// Configuration for cf-plex.
///
/// This struct represents the contents of `<root>/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wrapped executable, split with shell quoting rules (default: "cf").
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Variable pointing the wrapped executable at its session directory
    /// (default: "CF_HOME").
    #[serde(default = "default_session_env")]
    pub session_env: String,

    /// Separators of the batch credential string.
    #[serde(default)]
    pub separators: Separators,

    /// Whether batch session directories survive the run.
    #[serde(default)]
    pub batch_retention: BatchRetention,

    /// Whether to append to `events.ndjson` in the store root.
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            session_env: default_session_env(),
            separators: Separators::default(),
            batch_retention: BatchRetention::default(),
            audit_log: default_true(),
        }
    }
}
