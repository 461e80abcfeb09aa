//! Layered configuration for `plugcall`.
//!
//! [`Config`] is resolved by `ortho_config` from, in increasing precedence:
//! built-in defaults, a TOML configuration file (`--config-path` or
//! `PLUGCALL_CONFIG_PATH`), `PLUGCALL_*` environment variables, and command
//! line flags. The resolved values describe where the provider plugin lives,
//! who is calling it, and how the binary logs.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use plugcall::{CallContext, PluginDescriptor, PluginError};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_REQUESTER_ID, DEFAULT_TIMEOUT_SECS, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved `plugcall` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PLUGCALL")]
#[serde(default)]
pub struct Config {
    /// Absolute path of the plugin executable.
    pub executable: Utf8PathBuf,
    /// Jobs directory exposed to the plugin.
    pub jobs_dir: Utf8PathBuf,
    /// Packages directory exposed to the plugin.
    pub packages_dir: Utf8PathBuf,
    /// Identifier sent as the request context.
    pub requester_id: String,
    /// Deadline for one plugin call in seconds; zero waits indefinitely.
    pub timeout_secs: u64,
    /// Tracing filter expression.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: Utf8PathBuf::new(),
            jobs_dir: Utf8PathBuf::new(),
            packages_dir: Utf8PathBuf::new(),
            requester_id: DEFAULT_REQUESTER_ID.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Builds and validates the plugin descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidDescriptor`] when the configured
    /// executable is missing or relative.
    pub fn plugin_descriptor(&self) -> Result<PluginDescriptor, PluginError> {
        let descriptor = PluginDescriptor::new(
            PathBuf::from(self.executable.as_std_path()),
            PathBuf::from(self.jobs_dir.as_std_path()),
            PathBuf::from(self.packages_dir.as_std_path()),
        );
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Returns the context attached to every call.
    #[must_use]
    pub fn call_context(&self) -> CallContext {
        CallContext::new(self.requester_id.as_str())
    }

    /// Returns the per-call deadline, if one is configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
