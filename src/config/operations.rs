//! Config loading, environment overrides, and validation.

use super::model::Config;
use super::types::BatchRetention;
use crate::context::{
    BATCH_RETENTION_VAR, EXECUTABLE_VAR, EnvSnapshot, SEP_CREDS_ENDPOINT_VAR, SEP_TRIPLE_VAR,
    SEP_USER_PASS_VAR,
};
use crate::error::{PlexError, Result};
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(PlexError::Io)` - The file could not be read
    /// * `Err(PlexError::Config)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PlexError::io("read config file", path, e))?;
        Self::from_yaml(&content)
    }

    /// Load config from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| PlexError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `CF_PLEX_*` overrides, then re-validate.
    pub fn apply_env(&mut self, env: &EnvSnapshot) -> Result<()> {
        if let Some(value) = env.get(SEP_TRIPLE_VAR) {
            self.separators.triple = value.to_string();
        }
        if let Some(value) = env.get(SEP_CREDS_ENDPOINT_VAR) {
            self.separators.creds_endpoint = value.to_string();
        }
        if let Some(value) = env.get(SEP_USER_PASS_VAR) {
            self.separators.user_pass = value.to_string();
        }
        if let Some(value) = env.get(EXECUTABLE_VAR) {
            self.executable = value.to_string();
        }
        if let Some(value) = env.get(BATCH_RETENTION_VAR) {
            self.batch_retention = BatchRetention::from_str(value).ok_or_else(|| {
                PlexError::Config(format!(
                    "{} must be 'keep' or 'remove' (found '{}')",
                    BATCH_RETENTION_VAR, value
                ))
            })?;
        }
        self.validate()
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - every separator must be non-empty
    /// - `executable` must split into at least one word
    /// - `session_env` must be a non-empty variable name without `=`
    pub fn validate(&self) -> Result<()> {
        let separators = [
            ("triple", &self.separators.triple),
            ("creds_endpoint", &self.separators.creds_endpoint),
            ("user_pass", &self.separators.user_pass),
        ];
        for (name, value) in separators {
            if value.is_empty() {
                return Err(PlexError::Config(format!(
                    "separators.{} must not be empty",
                    name
                )));
            }
        }

        match shell_words::split(&self.executable) {
            Ok(words) if !words.is_empty() => {}
            Ok(_) => {
                return Err(PlexError::Config("executable must not be empty".to_string()));
            }
            Err(e) => {
                return Err(PlexError::Config(format!(
                    "failed to parse executable '{}': {}",
                    self.executable, e
                )));
            }
        }

        if self.session_env.is_empty() || self.session_env.contains('=') {
            return Err(PlexError::Config(format!(
                "session_env must be a variable name (found '{}')",
                self.session_env
            )));
        }

        Ok(())
    }
}
