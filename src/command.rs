// src/command.rs

//! Native tool invocation
//!
//! Every install, remove and query goes through a [`CommandRunner`]. The
//! system implementation blocks until the child exits and buffers its whole
//! output; there is no timeout and no cancellation.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Runs native tools
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion and capture its output
    ///
    /// Only failure to launch is an `Err`; a non-zero exit is reported
    /// through [`CommandOutput::code`].
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Runs tools as real child processes with `LANG=C`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        debug!("Running: {} {}", program, display_args(args));

        let output = Command::new(program)
            .args(args)
            .env("LANG", "C")
            .output()?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!("{} exited with {:?}", program, result.code);
        Ok(result)
    }
}

/// A native tool that ran but did not succeed
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}: {output}", ExitCode(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        output: String,
    },
}

impl CommandError {
    pub fn exit(program: &str, output: &CommandOutput) -> Self {
        CommandError::Exit {
            program: program.to_string(),
            code: output.code,
            output: output.combined(),
        }
    }

    /// Whether the program itself could not be found
    pub fn is_missing_program(&self) -> bool {
        matches!(self, CommandError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

struct ExitCode<'a>(&'a Option<i32>);

impl fmt::Display for ExitCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "status {}", code),
            None => f.write_str("signal"),
        }
    }
}

/// Build an argument vector from anything string-like
pub fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    items.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}

pub(crate) fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
