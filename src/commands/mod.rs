//! Command implementations for cf-plex.
//!
//! This module routes parsed CLI commands to their handlers. Every handler
//! returns the process exit code: cf-plex's own failures are errors, while a
//! wrapped command's non-zero exit is an ordinary result passed through.


use crate::cli::{AddTargetArgs, Cli, Command, ListTargetsArgs, RemoveTargetArgs};
use crate::context::PlexContext;
use crate::dispatch::{
    DispatchOutcome, DispatchRequest, Dispatcher, auth_args, login_args, set_endpoint_args,
};
use crate::error::{PlexError, Result};
use crate::events::{self, Event, EventAction};
use crate::exit_codes;
use crate::runner::{ProcessRunner, Runner, redacted_args};
use crate::target::Group;
use serde_json::json;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli, ctx: &PlexContext) -> Result<i32> {
    match cli.command {
        Command::AddTarget(args) => {
            let group = args.group.clone().or(cli.group);
            cmd_add_target(ctx, args, group)
        }
        Command::ListTargets(args) => cmd_list_targets(ctx, args),
        Command::RemoveTarget(args) => {
            let group = args.group.clone().or(cli.group);
            cmd_remove_target(ctx, args, group)
        }
        Command::Run(args) => cmd_run(ctx, DispatchRequest::new(cli.group, args)),
    }
}

fn process_runner(ctx: &PlexContext) -> Result<ProcessRunner<std::io::Stdout>> {
    ProcessRunner::stdout(&ctx.config.executable, &ctx.config.session_env)
}

fn cmd_add_target(ctx: &PlexContext, args: AddTargetArgs, group: Option<String>) -> Result<i32> {
    ctx.require_managed_store()?;

    let store = ctx.store();
    let path = match &group {
        Some(group) => store.add_to_group(group, &args.endpoint)?,
        None => store.add(&args.endpoint)?,
    };

    let mut runner = process_runner(ctx)?;
    let interactive = args.username.is_none();
    let exit_code = match (&args.username, &args.password) {
        (Some(username), Some(password)) => {
            let endpoint = runner.run(&path, &set_endpoint_args(&args.endpoint))?;
            if endpoint.is_success() {
                runner.run(&path, &auth_args(username, password))?.exit_code
            } else {
                endpoint.exit_code
            }
        }
        _ => runner.run(&path, &login_args(&args.endpoint))?.exit_code,
    };

    events::record(
        ctx,
        Event::new(EventAction::TargetAdd)
            .with_target(&args.endpoint)
            .with_details(json!({
                "group": group,
                "interactive": interactive,
                "exit_code": exit_code,
            })),
    );

    if exit_code == exit_codes::SUCCESS {
        if let Some(group) = &group {
            println!("Added {} to group '{}'", args.endpoint, group);
        }
    }
    Ok(exit_code)
}

fn cmd_list_targets(ctx: &PlexContext, args: ListTargetsArgs) -> Result<i32> {
    ctx.require_managed_store()?;

    let groups = ctx.store().list()?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&groups)
            .map_err(|e| PlexError::UserError(format!("failed to serialize targets: {}", e)))?;
        println!("{}", rendered);
    } else {
        print!("{}", render_groups(&groups));
    }
    Ok(exit_codes::SUCCESS)
}

/// Plain-text listing: each group name, then its endpoints indented by a tab.
fn render_groups(groups: &[Group]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&group.name);
        out.push('\n');
        for target in &group.targets {
            out.push('\t');
            out.push_str(&target.name);
            out.push('\n');
        }
    }
    out
}

fn cmd_remove_target(
    ctx: &PlexContext,
    args: RemoveTargetArgs,
    group: Option<String>,
) -> Result<i32> {
    ctx.require_managed_store()?;

    let store = ctx.store();
    match &group {
        Some(group) => {
            store.remove_from_group(group, &args.endpoint)?;
            println!("Removed {} from '{}'", args.endpoint, group);
        }
        None => {
            store.remove(&args.endpoint)?;
            println!("Removed {}", args.endpoint);
        }
    }

    events::record(
        ctx,
        Event::new(EventAction::TargetRemove)
            .with_target(&args.endpoint)
            .with_details(json!({ "group": group })),
    );
    Ok(exit_codes::SUCCESS)
}

fn cmd_run(ctx: &PlexContext, request: DispatchRequest) -> Result<i32> {
    let store = ctx.store();
    let mut dispatcher = Dispatcher::new(&store, process_runner(ctx)?);

    let targets = dispatcher.resolve(&request, ctx.batch.as_deref(), &ctx.config.separators)?;

    println!();
    let outcome = dispatcher.execute(&targets, &request.args, request.force);
    if ctx.is_batch() {
        dispatcher.release_batch(&targets, ctx.config.batch_retention);
    }
    let outcome = outcome?;

    events::record(ctx, dispatch_event(&request, ctx.is_batch(), &outcome));
    Ok(outcome.exit_code)
}

fn dispatch_event(request: &DispatchRequest, batch: bool, outcome: &DispatchOutcome) -> Event {
    let results: Vec<_> = outcome
        .results
        .iter()
        .map(|r| json!({ "target": r.target.name, "exit_code": r.exit_code }))
        .collect();

    Event::new(EventAction::Dispatch).with_details(json!({
        "args": redacted_args(&request.args),
        "group": request.group,
        "batch": batch,
        "force": request.force,
        "exit_code": outcome.exit_code,
        "results": results,
    }))
}
