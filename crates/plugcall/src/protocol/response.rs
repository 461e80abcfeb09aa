//! Response decoding and failure classification.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::PluginError;
use crate::process::ProcessOutput;

/// Response read from a plugin's stdout.
///
/// Every field is optional on the wire. A populated [`CallOutput::error`]
/// means the plugin ran and reported that the requested operation failed;
/// it is data for the caller, not a failure of the call.
///
/// # Example
///
/// ```
/// use plugcall::CallOutput;
///
/// let output: CallOutput =
///     serde_json::from_str(r#"{"result":"fake-cid","error":{"message":"fake-run-error"}}"#)
///         .expect("decode");
/// assert_eq!(output.result(), "fake-cid");
/// assert_eq!(output.error().map(|e| e.message()), Some("fake-run-error"));
/// assert_eq!(output.log(), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOutput {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<CallError>,
    #[serde(default, deserialize_with = "null_as_default")]
    log: String,
}

impl CallOutput {
    /// Creates a successful output carrying `result`.
    #[must_use]
    pub const fn new(result: Value) -> Self {
        Self {
            result,
            error: None,
            log: String::new(),
        }
    }

    /// Attaches a domain error.
    #[must_use]
    pub fn with_error(mut self, error: CallError) -> Self {
        self.error = Some(error);
        self
    }

    /// Attaches the plugin's log text.
    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    /// Returns the opaque result value.
    #[must_use]
    pub const fn result(&self) -> &Value {
        &self.result
    }

    /// Returns the domain error reported by the plugin, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CallError> {
        self.error.as_ref()
    }

    /// Returns the log text the plugin attached to its response.
    #[must_use]
    pub const fn log(&self) -> &str {
        self.log.as_str()
    }

    /// Converts the output into the result value or the domain error.
    ///
    /// # Errors
    ///
    /// Returns the plugin's [`CallError`] when one was reported.
    pub fn into_result(self) -> Result<Value, CallError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Failure of the requested operation, as reported by the plugin.
///
/// The plugin may classify the failure (`type` on the wire) and state
/// whether retrying could succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct CallError {
    message: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    ok_to_retry: bool,
}

impl CallError {
    /// Creates an unclassified, non-retryable error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            ok_to_retry: false,
        }
    }

    /// Sets the plugin's classification of the failure.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Marks the failure as retryable.
    #[must_use]
    pub const fn retryable(mut self) -> Self {
        self.ok_to_retry = true;
        self
    }

    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the plugin's classification, if provided.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns whether the plugin considers a retry worthwhile.
    #[must_use]
    pub const fn ok_to_retry(&self) -> bool {
        self.ok_to_retry
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn check_exit(executable: &Path, output: &ProcessOutput) -> Result<(), PluginError> {
    if output.succeeded() {
        return Ok(());
    }
    Err(match output.exit_code {
        Some(status) => PluginError::NonZeroExit {
            executable: executable.to_path_buf(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        },
        None => PluginError::Terminated {
            executable: executable.to_path_buf(),
        },
    })
}

/// Decodes captured process output into a [`CallOutput`].
///
/// A failed exit always wins over the body: a non-zero or signal exit is a
/// transport error even when stdout holds a well-formed response.
///
/// # Errors
///
/// Returns [`PluginError::NonZeroExit`] or [`PluginError::Terminated`] when
/// the process did not exit cleanly, and
/// [`PluginError::DeserializeResponse`] when stdout is not a JSON object of
/// the expected shape.
pub fn decode_output(executable: &Path, output: &ProcessOutput) -> Result<CallOutput, PluginError> {
    check_exit(executable, output)?;

    let value: Value = serde_json::from_slice(&output.stdout).map_err(|err| {
        PluginError::DeserializeResponse {
            message: format!(
                "plugin '{}' produced invalid JSON: {err}",
                executable.display()
            ),
            source: Some(err),
        }
    })?;

    if !value.is_object() {
        return Err(PluginError::DeserializeResponse {
            message: format!(
                "plugin '{}' produced {} instead of a JSON object",
                executable.display(),
                json_kind(&value)
            ),
            source: None,
        });
    }

    serde_json::from_value(value).map_err(|err| PluginError::DeserializeResponse {
        message: format!(
            "plugin '{}' produced a malformed response: {err}",
            executable.display()
        ),
        source: Some(err),
    })
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
