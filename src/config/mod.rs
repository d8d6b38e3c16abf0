//! Configuration model for cf-plex.
//!
//! Settings come from an optional `config.yaml` in the store root, then
//! `CF_PLEX_*` environment variables override individual fields. Unknown
//! YAML fields are ignored for forward compatibility.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::BatchRetention;
