//! cf-plex: run Cloud Foundry CLI commands against many endpoints at once.
//!
//! This is the main entry point for the `cf-plex` CLI. It parses arguments,
//! resolves the environment, dispatches to the appropriate command handler,
//! and turns the result into the process exit code.

mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod coords;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod runner;
pub mod target;

use clap::Parser;
use clap::error::ErrorKind;
use cli::Cli;
use context::PlexContext;
use error::PlexError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().collect();

    let cli = match Cli::try_parse_from(&raw) {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::DisplayVersion => {
            print!("{}", err);
            return ExitCode::from(exit_codes::SUCCESS as u8);
        }
        Err(_) => return report(PlexError::Usage(cli::usage_text(&raw))),
    };

    match PlexContext::resolve().and_then(|ctx| commands::dispatch(cli, &ctx)) {
        Ok(code) => exit_code(code),
        Err(err) => report(err),
    }
}

fn report(err: PlexError) -> ExitCode {
    match &err {
        PlexError::Usage(text) => println!("{}", text),
        _ => eprintln!("Error: {}", err),
    }
    exit_code(err.exit_code())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(exit_codes::FAILURE as u8))
}
