//! Environment resolution for cf-plex.
//!
//! Everything cf-plex reads from its own environment is resolved here, once,
//! into a [`PlexContext`]: where the store lives, whether a batch credential
//! string is set, and the effective [`Config`].

use crate::config::Config;
use crate::error::{PlexError, Result};
use crate::target::TargetStore;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Overrides the store root.
pub const HOME_VAR: &str = "CF_PLEX_HOME";

/// Batch credential string; when set, targets come from it instead of the store.
pub const BATCH_VAR: &str = "CF_PLEX_APIS";

/// Overrides the separator between batch records.
pub const SEP_TRIPLE_VAR: &str = "CF_PLEX_SEP_TRIPLE";

/// Overrides the separator between credentials and endpoint.
pub const SEP_CREDS_ENDPOINT_VAR: &str = "CF_PLEX_SEP_CREDS_API";

/// Overrides the separator between username and password.
pub const SEP_USER_PASS_VAR: &str = "CF_PLEX_SEP_USER_PASS";

/// Overrides the wrapped executable.
pub const EXECUTABLE_VAR: &str = "CF_PLEX_EXECUTABLE";

/// Overrides the batch retention policy (`keep` or `remove`).
pub const BATCH_RETENTION_VAR: &str = "CF_PLEX_BATCH_RETENTION";

/// Store directory name under the user's home directory.
pub const DEFAULT_HOME_DIR: &str = ".cfplex";

/// Optional config file in the store root.
pub const CONFIG_FILE: &str = "config.yaml";

/// Audit log file in the store root.
pub const EVENTS_FILE: &str = "events.ndjson";

/// A read-only copy of the process environment.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Snapshot the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl FromIterator<(String, String)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Resolved settings for one cf-plex invocation.
#[derive(Debug, Clone)]
pub struct PlexContext {
    /// Absolute path to the store root.
    pub root: PathBuf,

    /// Batch credential string, if set and non-empty.
    pub batch: Option<String>,

    /// Effective configuration (file plus environment overrides).
    pub config: Config,
}

impl PlexContext {
    /// Resolve the context from the current process environment.
    pub fn resolve() -> Result<Self> {
        Self::from_env(&EnvSnapshot::capture())
    }

    /// Resolve the context from an environment snapshot.
    ///
    /// The root is `CF_PLEX_HOME`, falling back to `~/.cfplex`.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        Self::with_home(env, dirs::home_dir())
    }

    fn with_home(env: &EnvSnapshot, user_home: Option<PathBuf>) -> Result<Self> {
        let root = match env.get(HOME_VAR) {
            Some(home) => PathBuf::from(home),
            None => user_home
                .filter(|home| !home.as_os_str().is_empty())
                .ok_or_else(|| {
                    PlexError::UserError(format!(
                        "cannot determine the home directory; set {} to choose where targets are stored",
                        HOME_VAR
                    ))
                })?
                .join(DEFAULT_HOME_DIR),
        };

        let mut config = Config::load_or_default(root.join(CONFIG_FILE))?;
        config.apply_env(env)?;

        Ok(Self {
            root,
            batch: env.get(BATCH_VAR).map(str::to_string),
            config,
        })
    }

    pub fn store(&self) -> TargetStore {
        TargetStore::new(&self.root)
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join(EVENTS_FILE)
    }

    pub fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Fail if the store must not be modified in this invocation.
    ///
    /// Management commands are refused while the batch string is set.
    pub fn require_managed_store(&self) -> Result<()> {
        if self.is_batch() {
            return Err(PlexError::BatchModeManagement(BATCH_VAR));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatchRetention;
    use serial_test::serial;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn plex_home_sets_root() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_string_lossy().to_string();

        let ctx = PlexContext::with_home(
            &env(&[(HOME_VAR, &home)]),
            Some(PathBuf::from("/elsewhere")),
        )
        .unwrap();

        assert_eq!(ctx.root, temp.path());
        assert_eq!(ctx.events_path(), temp.path().join("events.ndjson"));
        assert!(!ctx.is_batch());
    }

    #[test]
    fn falls_back_to_home_directory() {
        let temp = TempDir::new().unwrap();

        let ctx = PlexContext::with_home(&env(&[(HOME_VAR, "")]), Some(temp.path().to_path_buf()))
            .unwrap();

        assert_eq!(ctx.root, temp.path().join(".cfplex"));
    }

    #[test]
    fn missing_home_is_a_user_error() {
        let err = PlexContext::with_home(&env(&[]), None).unwrap_err();
        assert!(err.to_string().contains("CF_PLEX_HOME"));

        let err = PlexContext::with_home(&env(&[]), Some(PathBuf::new())).unwrap_err();
        assert!(matches!(err, PlexError::UserError(_)));
    }

    #[test]
    fn reads_config_file_from_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.yaml"), "batch_retention: remove\n").unwrap();
        let home = temp.path().to_string_lossy().to_string();

        let ctx = PlexContext::from_env(&env(&[(HOME_VAR, &home)])).unwrap();

        assert_eq!(ctx.config.batch_retention, BatchRetention::Remove);
    }

    #[test]
    fn batch_mode_blocks_management() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_string_lossy().to_string();

        let ctx = PlexContext::from_env(&env(&[(HOME_VAR, &home), (BATCH_VAR, "u^p>https://x.com")]))
            .unwrap();

        assert_eq!(ctx.batch.as_deref(), Some("u^p>https://x.com"));
        let err = ctx.require_managed_store().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Managing targets is not allowed when CF_PLEX_APIS is set"
        );
    }

    #[test]
    fn empty_batch_string_is_unset() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_string_lossy().to_string();

        let ctx = PlexContext::from_env(&env(&[(HOME_VAR, &home), (BATCH_VAR, "")])).unwrap();

        assert!(!ctx.is_batch());
        ctx.require_managed_store().unwrap();
    }

    #[test]
    #[serial]
    fn resolve_reads_process_environment() {
        let temp = TempDir::new().unwrap();
        // SAFETY: serialized with every other test that touches the environment.
        unsafe {
            std::env::set_var(HOME_VAR, temp.path());
            std::env::set_var(SEP_TRIPLE_VAR, "|");
        }

        let ctx = PlexContext::resolve();

        unsafe {
            std::env::remove_var(HOME_VAR);
            std::env::remove_var(SEP_TRIPLE_VAR);
        }
        let ctx = ctx.unwrap();
        assert_eq!(ctx.root, temp.path());
        assert_eq!(ctx.config.separators.triple, "|");
    }
}
