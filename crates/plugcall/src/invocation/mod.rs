//! Host-specific strategies for starting a plugin process.
//!
//! Plugins are conventionally POSIX shell scripts. On POSIX hosts they are
//! executed directly inside an isolated environment. On hosts that run them
//! through a POSIX emulation layer, environment passthrough is unreliable, so
//! the same variables are exported textually inside a shell command instead.
//! Both strategies deliver the identical request bytes on stdin and leave the
//! output streams to the executor.

use crate::descriptor::PluginDescriptor;
use crate::process::CommandSpec;

mod shell;

pub use self::shell::{DEFAULT_TOOL_DIRS, ShellWrapped};

/// Environment variable naming the packages directory.
pub const PACKAGES_DIR_ENV: &str = "BOSH_PACKAGES_DIR";

/// Environment variable naming the jobs directory.
pub const JOBS_DIR_ENV: &str = "BOSH_JOBS_DIR";

/// `PATH` visible to every plugin.
pub const MINIMAL_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/sbin";

/// How a plugin process is created.
///
/// The strategy is chosen once, when a runner is built, and never changes for
/// the lifetime of that runner.
///
/// # Example
///
/// ```
/// use plugcall::invocation::{InvocationStrategy, MINIMAL_PATH};
/// use plugcall::PluginDescriptor;
/// use std::path::PathBuf;
///
/// let descriptor = PluginDescriptor::for_job(
///     PathBuf::from("/jobs/cpi"),
///     PathBuf::from("/jobs"),
///     PathBuf::from("/packages"),
/// );
/// let command = InvocationStrategy::Direct.build(&descriptor, b"{}".to_vec());
/// assert!(command.isolated_env());
/// assert!(command.args().is_empty());
/// assert_eq!(command.env().get("PATH").map(String::as_str), Some(MINIMAL_PATH));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStrategy {
    /// Execute the plugin directly with an isolated three-variable
    /// environment.
    Direct,
    /// Run the plugin through a POSIX shell that exports the environment
    /// itself.
    ShellWrapped(ShellWrapped),
}

impl InvocationStrategy {
    /// Selects the strategy suited to the compilation target.
    #[must_use]
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::ShellWrapped(ShellWrapped::from_current_dir())
        } else {
            Self::Direct
        }
    }

    /// Builds the command that runs the plugin with `stdin` as its input.
    #[must_use]
    pub fn build(&self, descriptor: &PluginDescriptor, stdin: Vec<u8>) -> CommandSpec {
        match self {
            Self::Direct => direct_command(descriptor, stdin),
            Self::ShellWrapped(shell) => shell.command(descriptor, stdin),
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ShellWrapped(_) => "shell_wrapped",
        }
    }
}

fn direct_command(descriptor: &PluginDescriptor, stdin: Vec<u8>) -> CommandSpec {
    CommandSpec::new(descriptor.executable())
        .with_env(PACKAGES_DIR_ENV, descriptor.packages_dir().to_string_lossy())
        .with_env(JOBS_DIR_ENV, descriptor.jobs_dir().to_string_lossy())
        .with_env("PATH", MINIMAL_PATH)
        .isolated()
        .with_stdin(stdin)
}
