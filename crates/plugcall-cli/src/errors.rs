//! Error types surfaced by the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use plugcall::PluginError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("failed to encode call output: {0}")]
    Encode(serde_json::Error),
    #[error("failed to write call output: {0}")]
    Output(io::Error),
}
