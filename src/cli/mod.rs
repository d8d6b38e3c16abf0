//! CLI argument parsing for cf-plex.
//!
//! Uses clap derive macros for the management subcommands. Anything that is
//! not a management subcommand is captured verbatim as an external
//! subcommand and handed to the wrapped executable.

use clap::{Parser, Subcommand};

/// Usage line for running a wrapped command.
pub const RUN_USAGE: &str = "cf-plex [-g <group>] <cf cli command> [--force]";

/// Usage line for `add-target`.
pub const ADD_USAGE: &str = "cf-plex add-target [-g <group>] <endpoint> [<username> <password>]";

/// Usage line for `list-targets`.
pub const LIST_USAGE: &str = "cf-plex list-targets [--json]";

/// Usage line for `remove-target`.
pub const REMOVE_USAGE: &str = "cf-plex remove-target [-g <group>] <endpoint>";

/// Run one Cloud Foundry CLI command against many API endpoints.
///
/// Each endpoint keeps its own session directory, so logins never leak
/// between them. Endpoints can be organised into groups, or supplied
/// ad hoc through CF_PLEX_APIS.
#[derive(Parser, Debug)]
#[command(name = "cf-plex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only run against the targets of this group ('default' for ungrouped targets).
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub group: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cf-plex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add an endpoint and log in to it.
    ///
    /// With a username and password the login is non-interactive;
    /// without them the wrapped tool prompts for credentials.
    AddTarget(AddTargetArgs),

    /// List groups and their endpoints.
    ListTargets(ListTargetsArgs),

    /// Remove an endpoint and its session state.
    RemoveTarget(RemoveTargetArgs),

    /// Any other command is run against every selected endpoint.
    #[command(external_subcommand)]
    Run(Vec<String>),
}

/// Arguments for the `add-target` command.
#[derive(Parser, Debug)]
pub struct AddTargetArgs {
    /// Group to add the endpoint to.
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub group: Option<String>,

    /// API endpoint, e.g. https://api.example.com
    pub endpoint: String,

    /// Username for non-interactive login.
    #[arg(requires = "password")]
    pub username: Option<String>,

    /// Password for non-interactive login.
    pub password: Option<String>,
}

/// Arguments for the `list-targets` command.
#[derive(Parser, Debug)]
pub struct ListTargetsArgs {
    /// Print groups as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove-target` command.
#[derive(Parser, Debug)]
pub struct RemoveTargetArgs {
    /// Group to remove the endpoint from.
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub group: Option<String>,

    /// API endpoint to remove.
    pub endpoint: String,
}

/// Usage text for a command line that failed to parse.
///
/// Names the management subcommand the user was attempting, or lists every
/// form when it is unclear.
pub fn usage_text(raw: &[String]) -> String {
    let attempted = raw.iter().skip(1).find_map(|arg| match arg.as_str() {
        "add-target" => Some(ADD_USAGE),
        "list-targets" => Some(LIST_USAGE),
        "remove-target" => Some(REMOVE_USAGE),
        _ => None,
    });

    match attempted {
        Some(usage) => format!("Usage: {}", usage),
        None => format!(
            "Usage:\n{}\n{}\n{}\n{}",
            RUN_USAGE, ADD_USAGE, LIST_USAGE, REMOVE_USAGE
        ),
    }
}
