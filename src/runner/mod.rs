//! Wrapped-command executor.
//!
//! Runs the wrapped executable once per call with its session-directory
//! variable pointed at a target's isolated directory. Stdin and stderr are
//! inherited; stdout is relayed to the display sink while also being
//! captured, so callers can inspect what the command printed.

mod session_env;


pub use session_env::SessionEnv;

use crate::error::{PlexError, Result};
use crate::exit_codes;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Subcommand whose second argument is a password.
pub const AUTH_COMMAND: &str = "auth";

/// Replacement text for secrets in anything cf-plex prints or logs.
pub const EXPUNGED: &str = "[expunged]";

/// Result of one wrapped-command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Normalized exit code (see [`exit_code_of`]).
    pub exit_code: i32,
    /// Everything the command wrote to stdout.
    pub output: String,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == exit_codes::SUCCESS
    }
}

/// Runs the wrapped executable against one session directory.
pub trait Runner {
    fn run(&mut self, session_dir: &Path, args: &[String]) -> Result<RunOutcome>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, session_dir: &Path, args: &[String]) -> Result<RunOutcome> {
        (**self).run(session_dir, args)
    }
}

/// [`Runner`] that spawns a real child process.
pub struct ProcessRunner<W: Write> {
    executable: String,
    program: Vec<String>,
    session_var: String,
    env: SessionEnv,
    out: W,
}

impl ProcessRunner<io::Stdout> {
    /// Runner that inherits this process's environment and prints to stdout.
    pub fn stdout(executable: &str, session_var: &str) -> Result<Self> {
        Self::new(executable, session_var, SessionEnv::capture(), io::stdout())
    }
}

impl<W: Write> ProcessRunner<W> {
    /// Build a runner.
    ///
    /// `executable` is split with shell quoting rules, so it may carry
    /// leading arguments (e.g. `/usr/bin/env cf`).
    pub fn new(executable: &str, session_var: &str, env: SessionEnv, out: W) -> Result<Self> {
        let program = shell_words::split(executable).map_err(|e| {
            PlexError::Config(format!("failed to parse executable '{}': {}", executable, e))
        })?;
        if program.is_empty() {
            return Err(PlexError::Config("executable must not be empty".to_string()));
        }

        Ok(Self {
            executable: executable.to_string(),
            program,
            session_var: session_var.to_string(),
            env,
            out,
        })
    }

    /// Consume the runner, returning its display sink.
    pub fn into_output(self) -> W {
        self.out
    }

    fn announce(&mut self, session_dir: &Path, args: &[String]) -> io::Result<()> {
        let dir_name = session_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let line = status_line(&self.executable, args, &dir_name);
        self.out.write_all(line.as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> Runner for ProcessRunner<W> {
    fn run(&mut self, session_dir: &Path, args: &[String]) -> Result<RunOutcome> {
        self.announce(session_dir, args).map_err(|source| PlexError::Io {
            context: "failed to write status line".to_string(),
            source,
        })?;

        let mut env = self.env.clone();
        env.set(&self.session_var, session_dir.as_os_str());

        let (program, leading) = self
            .program
            .split_first()
            .ok_or_else(|| PlexError::Config("executable must not be empty".to_string()))?;
        let launch_error = |source| PlexError::Launch {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(leading)
            .args(args)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(launch_error)?;

        let mut captured = Vec::new();
        let relayed = match child.stdout.take() {
            Some(stdout) => tee(stdout, &mut self.out, &mut captured),
            None => Ok(()),
        };
        let status = child.wait().map_err(launch_error)?;
        relayed.map_err(|source| PlexError::Io {
            context: format!("failed to relay output of '{}'", program),
            source,
        })?;

        Ok(RunOutcome {
            exit_code: exit_code_of(status),
            output: String::from_utf8_lossy(&captured).into_owned(),
        })
    }
}

/// The "now running" line printed before each invocation, with any secret
/// argument replaced by [`EXPUNGED`].
pub fn status_line(executable: &str, args: &[String], dir_name: &str) -> String {
    let command_line = std::iter::once(executable)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    redact(
        &format!("\nRunning '{}' on {}\n", command_line, dir_name),
        args,
    )
}

/// The secret carried by an argument vector, if it has one.
pub fn secret_in(args: &[String]) -> Option<&str> {
    match args {
        [command, _, secret, ..] if command == AUTH_COMMAND && !secret.is_empty() => {
            Some(secret.as_str())
        }
        _ => None,
    }
}

/// Replace every occurrence of the argument vector's secret in `text`.
pub fn redact(text: &str, args: &[String]) -> String {
    match secret_in(args) {
        Some(secret) => text.replace(secret, EXPUNGED),
        None => text.to_string(),
    }
}

/// The argument vector with its secret replaced, for display and logging.
pub fn redacted_args(args: &[String]) -> Vec<String> {
    args.iter().map(|arg| redact(arg, args)).collect()
}

/// Normalize a child's exit status to a single code.
///
/// Signals map to `128 + signo`; a status with neither a code nor a signal
/// maps to [`exit_codes::UNREADABLE_STATUS`].
pub fn exit_code_of(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return exit_codes::SIGNAL_OFFSET + signal;
        }
    }
    status.code().unwrap_or(exit_codes::UNREADABLE_STATUS)
}

/// Copy `from` into `to` chunk by chunk, keeping a copy of everything.
///
/// Flushes after each chunk so prompts without a trailing newline show up
/// before the child blocks on input.
fn tee(mut from: impl Read, to: &mut impl Write, capture: &mut Vec<u8>) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = match from.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        capture.extend_from_slice(&buf[..n]);
        to.write_all(&buf[..n])?;
        to.flush()?;
    }
}
