// src/core/process/mod.rs

//! The process boundary: running external commands with a bounded wait time.
//!
//! No shell is involved. A [`ProcessSpec`] is a program plus an argument list,
//! so operator input can never be spliced into a command line.

use crate::core::RelayError;
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What a finished process left behind. The core only distinguishes zero from non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The most useful text to show when the process failed: stderr, then stdout.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        "no output".to_string()
    }

    /// stdout followed by stderr, for commands like `docker logs` that split a
    /// single stream across both.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut out = self.stdout.clone();
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&self.stderr);
                out
            }
        }
    }

    /// Converts a non-zero exit into [`RelayError::ProcessFailed`].
    pub fn into_checked(self, spec: &ProcessSpec) -> Result<ProcessOutput, RelayError> {
        if self.success() {
            return Ok(self);
        }
        let code = match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };
        Err(RelayError::ProcessFailed {
            command: spec.to_string(),
            code,
            detail: self.error_text(),
        })
    }
}

/// Runs external processes. Implemented by [`SystemProcessRunner`] in production
/// and by scripted runners in tests.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `spec` to completion or until `timeout` elapses.
    ///
    /// A non-zero exit is not an error at this level; spawn failures and
    /// timeouts are.
    async fn run(&self, spec: &ProcessSpec, timeout: Duration) -> Result<ProcessOutput, RelayError>;

    /// Runs `spec` and treats a non-zero exit as an error.
    async fn run_checked(
        &self,
        spec: &ProcessSpec,
        timeout: Duration,
    ) -> Result<ProcessOutput, RelayError> {
        self.run(spec, timeout).await?.into_checked(spec)
    }
}

/// Spawns real child processes through Tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, spec: &ProcessSpec, timeout: Duration) -> Result<ProcessOutput, RelayError> {
        debug!("Spawning '{}' with a {}s budget.", spec, timeout.as_secs());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the output future on timeout kills the child.
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => Ok(ProcessOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(RelayError::ProcessSpawn {
                command: spec.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => {
                warn!("'{}' exceeded its {}s budget and was killed.", spec, timeout.as_secs());
                Err(RelayError::ProcessTimeout {
                    command: spec.to_string(),
                    secs: timeout.as_secs(),
                })
            }
        }
    }
}
