//! Errors raised by the call runner.
//!
//! [`PluginError`] only covers failures of the call mechanism itself:
//! construction errors detected before a process is spawned, and transport
//! errors raised while running the plugin or reading its reply. A plugin that
//! runs to completion and reports a failed operation is not an error at this
//! layer; see [`CallError`](crate::protocol::CallError).

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ExecutionError;

/// Errors arising from a plugin call.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The method name was empty.
    #[error("plugin method name must not be empty")]
    EmptyMethod,

    /// The request could not be serialised to JSON.
    #[error("failed to serialise plugin request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The plugin descriptor failed validation.
    #[error("invalid plugin descriptor: {message}")]
    InvalidDescriptor {
        /// Description of the validation failure.
        message: String,
    },

    /// The process executor could not run the plugin to completion.
    #[error("executing plugin '{}' failed: {source}", .executable.display())]
    Execution {
        /// Plugin executable path.
        executable: PathBuf,
        /// Underlying execution failure.
        #[source]
        source: ExecutionError,
    },

    /// The plugin exited with a non-zero status code.
    #[error("plugin '{}' exited with non-zero status {status}: {stderr}", .executable.display())]
    NonZeroExit {
        /// Plugin executable path.
        executable: PathBuf,
        /// Process exit status.
        status: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The plugin was terminated by a signal before exiting.
    #[error("plugin '{}' was terminated before exiting", .executable.display())]
    Terminated {
        /// Plugin executable path.
        executable: PathBuf,
    },

    /// The plugin output could not be decoded.
    #[error("failed to deserialise plugin response: {message}")]
    DeserializeResponse {
        /// Human-readable description of the parse failure.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl PluginError {
    /// Returns `true` for errors raised before any process was spawned.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::EmptyMethod | Self::SerializeRequest(_) | Self::InvalidDescriptor { .. }
        )
    }

    /// Returns `true` for failures of the process or its reply.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !self.is_construction()
    }
}
