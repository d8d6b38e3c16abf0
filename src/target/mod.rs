//! On-disk catalog of per-target session directories.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   https___api.one.example.com/      flat layout: the implicit "default" group
//!   groups/                           grouped layout, once any group exists
//!     nonprod/
//!       https___api.two.example.com/
//!   batch/                            ephemeral targets from the batch string
//!     https___api.three.example.com/
//! ```
//!
//! The existence of `groups/` switches the whole store from [`Layout::Flat`]
//! to [`Layout::Grouped`]. Directory names are [`sanitize`]d endpoints, so
//! listing the tree is enough to reconstruct every endpoint.

use crate::error::{PlexError, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};


/// Name of the directory holding one subdirectory per group.
pub const GROUPS_DIR: &str = "groups";

/// Reserved namespace for targets materialized from the batch string.
pub const BATCH_GROUP: &str = "batch";

/// Name of the implicit group formed by the flat layout.
pub const DEFAULT_GROUP: &str = "default";

const SCHEMES: [(&str, &str); 2] = [("https://", "https___"), ("http://", "http___")];

/// Encode an endpoint as a filesystem-safe directory name.
pub fn sanitize(endpoint: &str) -> String {
    SCHEMES
        .iter()
        .fold(endpoint.to_string(), |acc, (scheme, token)| acc.replace(scheme, token))
}

/// Exact inverse of [`sanitize`].
pub fn unsanitize(dir_name: &str) -> String {
    SCHEMES
        .iter()
        .fold(dir_name.to_string(), |acc, (scheme, token)| acc.replace(token, scheme))
}

/// One endpoint and its isolated session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Endpoint identifier, typically the API URL.
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// A named, ordered collection of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub targets: Vec<Target>,
}

/// Which of the two mutually exclusive on-disk layouts the store is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Targets live directly under the root.
    Flat,
    /// `<root>/groups` exists; targets are addressed through a group.
    Grouped,
}

/// The session-directory tree rooted at the cf-plex home.
#[derive(Debug, Clone)]
pub struct TargetStore {
    root: PathBuf,
}

impl TargetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn groups_dir(&self) -> PathBuf {
        self.root.join(GROUPS_DIR)
    }

    fn group_dir(&self, group: &str) -> PathBuf {
        self.groups_dir().join(group)
    }

    /// True iff `<root>/groups` exists.
    pub fn groups_exist(&self) -> bool {
        self.groups_dir().exists()
    }

    /// Probe the layout once; callers hold on to the answer.
    pub fn layout(&self) -> Layout {
        if self.groups_exist() {
            Layout::Grouped
        } else {
            Layout::Flat
        }
    }

    /// Add an endpoint to the flat layout. Idempotent.
    pub fn add(&self, endpoint: &str) -> Result<PathBuf> {
        let dir_name = checked_dir_name(endpoint)?;
        let path = self.root.join(dir_name);
        create_private_dir(&path)?;
        Ok(path)
    }

    /// Add an endpoint to a named group, creating the group if needed.
    pub fn add_to_group(&self, group: &str, endpoint: &str) -> Result<PathBuf> {
        if is_reserved_group(group) {
            return Err(PlexError::ReservedGroupName(group.to_string()));
        }
        checked_group_name(group)?;
        let dir_name = checked_dir_name(endpoint)?;
        let path = self.group_dir(group).join(dir_name);
        create_private_dir(&path)?;
        Ok(path)
    }

    /// Remove a flat-layout target and its session state.
    pub fn remove(&self, endpoint: &str) -> Result<()> {
        let dir_name = checked_dir_name(endpoint)?;
        remove_dir_if_present(&self.root.join(dir_name))
    }

    /// Remove a target from a group, deleting the group once it is empty.
    ///
    /// `default` names the flat namespace, as it does for [`Self::group`].
    pub fn remove_from_group(&self, group: &str, endpoint: &str) -> Result<()> {
        if group == DEFAULT_GROUP {
            return self.remove(endpoint);
        }
        if group == BATCH_GROUP {
            return Err(PlexError::ReservedGroupName(group.to_string()));
        }
        checked_group_name(group)?;
        let dir_name = checked_dir_name(endpoint)?;

        let group_dir = self.group_dir(group);
        remove_dir_if_present(&group_dir.join(dir_name))?;

        if !group_dir.exists() {
            return Ok(());
        }
        if list_dir_names(&group_dir)?.is_empty() {
            remove_dir_if_present(&group_dir)?;
        }
        Ok(())
    }

    /// List every user-visible group in store order.
    ///
    /// In the grouped layout this is one entry per group directory; in the
    /// flat layout it is a single `default` group. Targets are ordered by
    /// their encoded directory name.
    pub fn list(&self) -> Result<Vec<Group>> {
        match self.layout() {
            Layout::Grouped => {
                let mut groups = Vec::new();
                for name in list_dir_names(&self.groups_dir())? {
                    if name == BATCH_GROUP {
                        continue;
                    }
                    let targets = targets_in(&self.group_dir(&name))?;
                    groups.push(Group { name, targets });
                }
                Ok(groups)
            }
            Layout::Flat => Ok(vec![self.default_group()?]),
        }
    }

    /// Look up a named group. `default` always resolves to the flat namespace.
    pub fn group(&self, name: &str) -> Result<Option<Group>> {
        if name == DEFAULT_GROUP {
            return self.default_group().map(Some);
        }
        if name == BATCH_GROUP || checked_group_name(name).is_err() {
            return Ok(None);
        }
        let dir = self.group_dir(name);
        if !self.groups_exist() || !dir.is_dir() {
            return Ok(None);
        }
        let targets = targets_in(&dir)?;
        Ok(Some(Group {
            name: name.to_string(),
            targets,
        }))
    }

    /// The targets stored directly under the root.
    pub fn default_group(&self) -> Result<Group> {
        let targets = if self.root.exists() {
            targets_in(&self.root)?
        } else {
            Vec::new()
        };
        Ok(Group {
            name: DEFAULT_GROUP.to_string(),
            targets,
        })
    }

    /// Materialize an ephemeral target in the batch namespace.
    ///
    /// The directory is reused if an earlier run left it behind, so a
    /// session established then is still valid.
    pub fn batch_target(&self, endpoint: &str) -> Result<Target> {
        let dir_name = checked_dir_name(endpoint)?;
        let path = self.root.join(BATCH_GROUP).join(dir_name);
        create_private_dir(&path)?;
        Ok(Target {
            name: endpoint.to_string(),
            path,
        })
    }

    /// Delete a target's session directory.
    pub fn discard(&self, target: &Target) -> Result<()> {
        remove_dir_if_present(&target.path)
    }
}

/// Group names that cannot be created explicitly.
pub fn is_reserved_group(name: &str) -> bool {
    name == DEFAULT_GROUP || name == BATCH_GROUP
}

fn checked_group_name(group: &str) -> Result<()> {
    if group.is_empty() || group == "." || group == ".." || group.contains(['/', '\\']) {
        return Err(PlexError::UserError(format!("invalid group name '{}'", group)));
    }
    Ok(())
}

fn checked_dir_name(endpoint: &str) -> Result<String> {
    let dir_name = sanitize(endpoint);
    if dir_name == GROUPS_DIR || dir_name == BATCH_GROUP {
        return Err(PlexError::ReservedTargetName(endpoint.to_string()));
    }
    if dir_name.is_empty() || dir_name == "." || dir_name == ".." || dir_name.contains(['/', '\\'])
    {
        return Err(PlexError::UserError(format!(
            "'{}' cannot be used as a target: it does not encode to a single directory name",
            endpoint
        )));
    }
    Ok(dir_name)
}

fn targets_in(parent: &Path) -> Result<Vec<Target>> {
    let targets = list_dir_names(parent)?
        .into_iter()
        .filter(|name| name != GROUPS_DIR && name != BATCH_GROUP)
        .map(|name| Target {
            name: unsanitize(&name),
            path: parent.join(&name),
        })
        .collect();
    Ok(targets)
}

/// Names of the subdirectories of `path`, sorted bytewise. Files are skipped.
fn list_dir_names(path: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(path).map_err(|e| PlexError::io("read directory", path, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PlexError::io("read directory", path, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| PlexError::io("inspect", &entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Create a directory and its parents, readable only by the owner.
pub(crate) fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .map_err(|e| PlexError::io("create directory", path, e))
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PlexError::io("remove", path, e)),
    }
}
