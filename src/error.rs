//! Error types for the cf-plex CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use std::path::Path;
use thiserror::Error;

/// Main error type for cf-plex operations.
#[derive(Error, Debug)]
pub enum PlexError {
    /// Malformed command line. Carries the usage text to print.
    #[error("{0}")]
    Usage(String),

    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A batch segment did not contain each separator exactly once.
    #[error("{0} is invalid")]
    InvalidCoordinateFormat(String),

    /// Attempt to create a group whose name is reserved.
    #[error("group name '{0}' is reserved")]
    ReservedGroupName(String),

    /// Attempt to add a target whose directory name is reserved by the store layout.
    #[error("'{0}' cannot be used as a target: its directory name is reserved")]
    ReservedTargetName(String),

    /// A group filter named a group that does not exist.
    #[error("Group '{0}' not recognised")]
    UnknownGroup(String),

    /// Groups exist but no group filter was given.
    #[error(
        "-g <group> is mandatory whenever groups have been added. Use '-g default' to target endpoints without an explicit group."
    )]
    GroupRequired,

    /// No targets to run against.
    #[error("No targets have been set")]
    NoTargetsConfigured,

    /// Management subcommand used while the batch credential string is set.
    #[error("Managing targets is not allowed when {0} is set")]
    BatchModeManagement(&'static str),

    /// Filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The wrapped executable could not be started or waited on.
    #[error("failed to execute '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file or environment override is invalid.
    #[error("config validation failed: {0}")]
    Config(String),
}

impl PlexError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PlexError::Usage(_)
            | PlexError::UserError(_)
            | PlexError::InvalidCoordinateFormat(_)
            | PlexError::ReservedGroupName(_)
            | PlexError::ReservedTargetName(_)
            | PlexError::UnknownGroup(_)
            | PlexError::GroupRequired
            | PlexError::NoTargetsConfigured
            | PlexError::BatchModeManagement(_)
            | PlexError::Io { .. }
            | PlexError::Launch { .. }
            | PlexError::Config(_) => exit_codes::FAILURE,
        }
    }

    /// Wrap an I/O error with the operation and path it concerned.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        PlexError::Io {
            context: format!("failed to {} '{}'", action, path.display()),
            source,
        }
    }
}

/// Result type alias for cf-plex operations.
pub type Result<T> = std::result::Result<T, PlexError>;
