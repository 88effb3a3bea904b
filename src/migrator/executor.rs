//! Running the external migration tool.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
#[cfg(any(test, feature = "test-util"))]
use std::{collections::VecDeque, sync::Mutex};
use tracing::debug;

use crate::errors::Result;

/// What happens to the child's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Passed through to this process's console
    Stream,
    /// Dropped
    Discard,
}

/// One command to run.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub output: OutputMode,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: OutputMode) -> Self {
        Self { program: program.into(), args, output }
    }

    /// Arguments with any `-password=` value masked.
    pub fn redacted_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| match arg.strip_prefix("-password=") {
                Some(_) => "-password=[REDACTED]".to_string(),
                None => arg.clone(),
            })
            .collect()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.redacted_args())
            .field("output", &self.output)
            .finish()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.redacted_args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished command exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Runs commands on behalf of the migrator.
///
/// An `Err` means the command could not be run at all; a command that ran
/// and failed is reported through [`ExitOutcome`].
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<ExitOutcome>;
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        debug!(command = %invocation, "Spawning process");

        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());
        match invocation.output {
            OutputMode::Stream => command.stdout(Stdio::inherit()).stderr(Stdio::inherit()),
            OutputMode::Discard => command.stdout(Stdio::null()).stderr(Stdio::null()),
        };

        let status = command.status().await?;
        Ok(ExitOutcome { code: status.code() })
    }
}

/// Records every invocation and replies with scripted exit codes.
///
/// Exit codes are consumed in call order; once the script runs out every
/// call succeeds. Invocations containing an argument registered with
/// [`RecordingExecutor::fail_when_arg`] exit with code 1.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    exit_codes: Mutex<VecDeque<i32>>,
    failing_args: Vec<String>,
    spawn_error: Option<String>,
    invocations: Mutex<Vec<Invocation>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_codes(self, codes: impl IntoIterator<Item = i32>) -> Self {
        if let Ok(mut exit_codes) = self.exit_codes.lock() {
            exit_codes.extend(codes);
        }
        self
    }

    pub fn fail_when_arg(mut self, arg: impl Into<String>) -> Self {
        self.failing_args.push(arg.into());
        self
    }

    /// Every call fails as if the program did not exist.
    pub fn with_spawn_error(mut self, message: impl Into<String>) -> Self {
        self.spawn_error = Some(message.into());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(invocation.clone());
        }

        if let Some(message) = &self.spawn_error {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, message.clone()).into());
        }

        let scripted = self.exit_codes.lock().ok().and_then(|mut codes| codes.pop_front());
        let code = match scripted {
            Some(code) => code,
            None if invocation.args.iter().any(|arg| self.failing_args.contains(arg)) => 1,
            None => 0,
        };
        Ok(ExitOutcome::from_code(code))
    }
}
