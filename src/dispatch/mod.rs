//! Target resolution and sequential multi-target execution.
//!
//! A dispatch decides which targets an invocation applies to, then runs the
//! wrapped command against each of them in order. Without `--force` the
//! first failing target stops the run and its exit code becomes the overall
//! result; with `--force` every target runs and the last one's exit code
//! wins.


use crate::config::BatchRetention;
use crate::coords::{Coordinate, Separators, parse_coordinates};
use crate::error::{PlexError, Result};
use crate::exit_codes;
use crate::runner::{AUTH_COMMAND, Runner};
use crate::target::{Layout, Target, TargetStore};

/// Trailing argument that disables stop-on-first-failure.
pub const FORCE_FLAG: &str = "--force";

/// Printed by the wrapped tool when a session has no valid login.
pub const NOT_LOGGED_IN_MARKER: &str = "Not logged in";

/// Subcommand that points a session at an endpoint.
pub const SET_ENDPOINT_COMMAND: &str = "api";

/// Subcommand for interactive login.
pub const LOGIN_COMMAND: &str = "login";

/// Whether the output of a set-endpoint run says the session needs to log in.
pub fn needs_authentication(output: &str) -> bool {
    output.contains(NOT_LOGGED_IN_MARKER)
}

pub fn set_endpoint_args(endpoint: &str) -> Vec<String> {
    vec![SET_ENDPOINT_COMMAND.to_string(), endpoint.to_string()]
}

pub fn auth_args(username: &str, password: &str) -> Vec<String> {
    vec![
        AUTH_COMMAND.to_string(),
        username.to_string(),
        password.to_string(),
    ]
}

pub fn login_args(endpoint: &str) -> Vec<String> {
    vec![
        LOGIN_COMMAND.to_string(),
        "-a".to_string(),
        endpoint.to_string(),
    ]
}

/// A wrapped-command invocation as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub group: Option<String>,
    /// Arguments for the wrapped executable, without `--force`.
    pub args: Vec<String>,
    pub force: bool,
}

impl DispatchRequest {
    /// Split a trailing [`FORCE_FLAG`] off the argument vector.
    pub fn new(group: Option<String>, mut args: Vec<String>) -> Self {
        let force = args.last().is_some_and(|a| a == FORCE_FLAG);
        if force {
            args.pop();
        }
        Self { group, args, force }
    }
}

/// Exit code of one target's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    pub target: Target,
    pub exit_code: i32,
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Overall exit code.
    pub exit_code: i32,
    /// Targets that ran, in order. Targets after a stopping failure are absent.
    pub results: Vec<TargetResult>,
}

/// Resolves targets and runs the wrapped command against them.
pub struct Dispatcher<'a, R: Runner> {
    store: &'a TargetStore,
    runner: R,
}

impl<'a, R: Runner> Dispatcher<'a, R> {
    pub fn new(store: &'a TargetStore, runner: R) -> Self {
        Self { store, runner }
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Resolve the targets for a request.
    ///
    /// Priority: the batch string if present, then the group filter, then
    /// the flat layout. In the grouped layout a group filter is mandatory.
    pub fn resolve(
        &mut self,
        request: &DispatchRequest,
        batch: Option<&str>,
        separators: &Separators,
    ) -> Result<Vec<Target>> {
        match batch {
            Some(batch) => {
                let coords = parse_coordinates(batch, separators)?;
                self.materialize_batch(&coords)
            }
            None => self.resolve_stored(request.group.as_deref()),
        }
    }

    /// Resolve targets from the persistent store.
    pub fn resolve_stored(&self, group: Option<&str>) -> Result<Vec<Target>> {
        let targets = match group {
            Some(name) => {
                self.store
                    .group(name)?
                    .ok_or_else(|| PlexError::UnknownGroup(name.to_string()))?
                    .targets
            }
            None => match self.store.layout() {
                Layout::Grouped => return Err(PlexError::GroupRequired),
                Layout::Flat => self.store.default_group()?.targets,
            },
        };

        if targets.is_empty() {
            return Err(PlexError::NoTargetsConfigured);
        }
        Ok(targets)
    }

    /// Turn batch coordinates into ready-to-use ephemeral targets.
    ///
    /// Each session is pointed at its endpoint first; credentials are only
    /// sent when the tool reports that the session is not logged in, so a
    /// session kept from an earlier run is reused as is.
    pub fn materialize_batch(&mut self, coords: &[Coordinate]) -> Result<Vec<Target>> {
        // Every endpoint must map to a session directory before anything runs.
        let targets = coords
            .iter()
            .map(|coord| self.store.batch_target(&coord.endpoint))
            .collect::<Result<Vec<_>>>()?;

        for (coord, target) in coords.iter().zip(&targets) {
            let endpoint = self
                .runner
                .run(&target.path, &set_endpoint_args(&coord.endpoint))?;
            if !endpoint.is_success() {
                eprintln!(
                    "Warning: setting endpoint {} exited with code {}",
                    coord.endpoint, endpoint.exit_code
                );
            }

            if needs_authentication(&endpoint.output) {
                let auth = self
                    .runner
                    .run(&target.path, &auth_args(&coord.username, &coord.password))?;
                if !auth.is_success() {
                    eprintln!(
                        "Warning: authenticating against {} exited with code {}",
                        coord.endpoint, auth.exit_code
                    );
                }
            }
        }

        Ok(targets)
    }

    /// Run `args` against each target in order.
    pub fn execute(
        &mut self,
        targets: &[Target],
        args: &[String],
        force: bool,
    ) -> Result<DispatchOutcome> {
        let mut exit_code = exit_codes::SUCCESS;
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let outcome = self.runner.run(&target.path, args)?;
            exit_code = outcome.exit_code;
            results.push(TargetResult {
                target: target.clone(),
                exit_code,
            });

            if exit_code != exit_codes::SUCCESS && !force {
                break;
            }
        }

        Ok(DispatchOutcome { exit_code, results })
    }

    /// Apply the batch retention policy to targets from [`Self::materialize_batch`].
    pub fn release_batch(&self, targets: &[Target], retention: BatchRetention) {
        if retention == BatchRetention::Keep {
            return;
        }
        for target in targets {
            if let Err(e) = self.store.discard(target) {
                eprintln!("Warning: failed to remove batch session for {}: {}", target.name, e);
            }
        }
    }
}
