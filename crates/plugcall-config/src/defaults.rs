use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default plugin deadline in seconds; zero disables the deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 0;

/// Requester identifier sent when none is configured.
pub const DEFAULT_REQUESTER_ID: &str = "plugcall";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
