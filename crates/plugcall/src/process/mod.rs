//! Process execution seam between the call runner and the operating system.
//!
//! The runner never spawns processes itself. It hands a [`CommandSpec`] to a
//! [`ProcessExecutor`] and receives a [`ProcessOutput`] describing what the
//! process wrote and how it exited. [`SystemExecutor`] is the production
//! implementation; tests substitute doubles that return canned output.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

mod system;

pub use self::system::SystemExecutor;

/// Fully resolved description of one process to run.
///
/// # Example
///
/// ```
/// use plugcall::process::CommandSpec;
///
/// let command = CommandSpec::new("/bin/cat")
///     .with_env("PATH", "/usr/bin:/bin")
///     .isolated()
///     .with_stdin(b"{}".to_vec());
/// assert!(command.isolated_env());
/// assert_eq!(command.stdin(), b"{}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<OsString>,
    env: BTreeMap<String, String>,
    isolated_env: bool,
    stdin: Vec<u8>,
}

impl CommandSpec {
    /// Creates a command with no arguments, no extra environment and empty
    /// input.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            isolated_env: false,
            stdin: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable for the process.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Prevents the process from inheriting the caller's environment.
    #[must_use]
    pub const fn isolated(mut self) -> Self {
        self.isolated_env = true;
        self
    }

    /// Sets the bytes written to the process's standard input.
    #[must_use]
    pub fn with_stdin(mut self, stdin: Vec<u8>) -> Self {
        self.stdin = stdin;
        self
    }

    /// Returns the program to execute.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the argument list.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns the explicitly provided environment.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns whether the ambient environment is withheld from the process.
    #[must_use]
    pub const fn isolated_env(&self) -> bool {
        self.isolated_env
    }

    /// Returns the bytes written to standard input.
    #[must_use]
    pub fn stdin(&self) -> &[u8] {
        &self.stdin
    }
}

/// Captured result of a process that ran to exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Bytes written to standard output.
    pub stdout: Vec<u8>,
    /// Bytes written to standard error.
    pub stderr: Vec<u8>,
    /// Exit code, or `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Creates output for a process that exited with status zero.
    #[must_use]
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            exit_code: Some(0),
        }
    }

    /// Returns `true` if the process exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Failures that prevent a process from being run to completion.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The process could not be created.
    #[error("failed to spawn '{}': {source}", .program.display())]
    Spawn {
        /// Program that was being started.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Communicating with the running process failed.
    #[error("I/O error communicating with '{}': {source}", .program.display())]
    Io {
        /// Program being communicated with.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The process did not exit before the deadline and was killed.
    #[error("'{}' did not exit within {}ms and was killed", .program.display(), .timeout.as_millis())]
    Timeout {
        /// Program that timed out.
        program: PathBuf,
        /// Deadline that was exceeded.
        timeout: Duration,
    },
}

/// Runs a process described by a [`CommandSpec`].
///
/// # Example
///
/// ```
/// use plugcall::process::{CommandSpec, ExecutionError, ProcessExecutor, ProcessOutput};
///
/// struct CannedExecutor;
///
/// impl ProcessExecutor for CannedExecutor {
///     fn run(&self, _command: &CommandSpec) -> Result<ProcessOutput, ExecutionError> {
///         Ok(ProcessOutput::success(r#"{"result":"fake-cid"}"#))
///     }
/// }
/// ```
pub trait ProcessExecutor {
    /// Runs the command to exit, feeding it the configured input.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] if the process cannot be spawned, if
    /// communicating with it fails, or if it outlives the executor's
    /// deadline. A process that runs and exits non-zero is not an error at
    /// this layer.
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ExecutionError>;
}

impl<E: ProcessExecutor + ?Sized> ProcessExecutor for &E {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ExecutionError> {
        (**self).run(command)
    }
}

impl<E: ProcessExecutor + ?Sized> ProcessExecutor for Arc<E> {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ExecutionError> {
        (**self).run(command)
    }
}
