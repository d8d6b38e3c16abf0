//! The environment handed to each wrapped-command invocation.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// An explicit key/value view of a process environment.
///
/// Keys are unique, so setting a variable always replaces the previous
/// value instead of appending a second, contradictory entry. The map is
/// only turned into a list when a child is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl SessionEnv {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        std::env::vars_os().collect()
    }

    /// Insert a variable, replacing any existing value under the same name.
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Iterate `(name, value)` pairs, ready for `Command::envs`.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for SessionEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = SessionEnv::default();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}
