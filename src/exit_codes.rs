//! Exit code constants for the cf-plex CLI.
//!
//! cf-plex's own failures use a small fixed set of codes. When a wrapped
//! command fails, its exit code is passed through unchanged instead.
//! - 0: Success
//! - 1: Failure (bad args, resolution failure, launch failure)
//! - 128 + n: Wrapped command was killed by signal n
//! - 254: Wrapped command ended without a readable exit status

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Failure: bad arguments, invalid state, unknown group, launch error.
pub const FAILURE: i32 = 1;

/// Added to the signal number when a wrapped command is killed by a signal.
pub const SIGNAL_OFFSET: i32 = 128;

/// Reported when a wrapped command ended without a readable exit status.
pub const UNREADABLE_STATUS: i32 = 254;
