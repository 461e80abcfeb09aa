//! Shell-wrapped invocation for hosts running plugins under POSIX emulation.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::{JOBS_DIR_ENV, MINIMAL_PATH, PACKAGES_DIR_ENV};
use crate::descriptor::PluginDescriptor;
use crate::process::CommandSpec;

/// Tracing target for invocation decisions.
const INVOCATION_TARGET: &str = "plugcall::invocation";

/// Shell started by default and used to trace the plugin script.
const DEFAULT_SHELL: &str = "bash";

/// Emulation-layer tool directories appended to [`MINIMAL_PATH`].
pub const DEFAULT_TOOL_DIRS: [&str; 2] = [
    "/c/Windows/System32/WindowsPowerShell/v1.0",
    "/d/Program Files/Oracle/VirtualBox",
];

/// Runs the plugin as `bash -c "export ...; bash -x <plugin>"`.
///
/// Paths are rewritten into the emulation layer's convention (`C:\jobs`
/// becomes `/c/jobs`) and relative paths are anchored at the working
/// directory captured when the strategy was built. The ambient environment
/// is inherited by the shell; isolation is expressed by the exports.
///
/// # Example
///
/// ```
/// use plugcall::invocation::ShellWrapped;
/// use std::path::{Path, PathBuf};
///
/// let shell = ShellWrapped::new(PathBuf::from(r"C:\work"));
/// assert_eq!(shell.emulated_path(Path::new(r"D:\jobs\cpi")), "/d/jobs/cpi");
/// assert_eq!(shell.emulated_path(Path::new("packages")), "/c/work/packages");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellWrapped {
    shell: PathBuf,
    working_dir: PathBuf,
    tool_dirs: Vec<String>,
}

impl ShellWrapped {
    /// Creates a strategy anchored at `working_dir` with the default shell and
    /// tool directories.
    #[must_use]
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            working_dir,
            tool_dirs: DEFAULT_TOOL_DIRS.iter().map(|dir| (*dir).to_owned()).collect(),
        }
    }

    /// Creates a strategy anchored at the process working directory.
    #[must_use]
    pub fn from_current_dir() -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|error| {
            warn!(
                target: INVOCATION_TARGET,
                %error,
                "cannot determine working directory; relative plugin paths stay relative"
            );
            PathBuf::new()
        });
        Self::new(working_dir)
    }

    /// Overrides the shell program.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Replaces the emulation-layer tool directories appended to `PATH`.
    #[must_use]
    pub fn with_tool_dirs(mut self, tool_dirs: Vec<String>) -> Self {
        self.tool_dirs = tool_dirs;
        self
    }

    /// Returns the shell program.
    #[must_use]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// Returns the `PATH` exported to the plugin.
    #[must_use]
    pub fn path_variable(&self) -> String {
        std::iter::once(MINIMAL_PATH)
            .chain(self.tool_dirs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Rewrites `path` into the emulation layer's absolute form.
    #[must_use]
    pub fn emulated_path(&self, path: &Path) -> String {
        let converted = emulation_layout(&path.to_string_lossy());
        if converted.starts_with('/') {
            return converted;
        }
        let base = emulation_layout(&self.working_dir.to_string_lossy());
        if base.is_empty() {
            return converted;
        }
        format!("{}/{converted}", base.trim_end_matches('/'))
    }

    /// Returns the command string passed to the shell.
    #[must_use]
    pub fn script(&self, descriptor: &PluginDescriptor) -> String {
        format!(
            "export {PACKAGES_DIR_ENV}={}; export {JOBS_DIR_ENV}={}; export PATH={}; {DEFAULT_SHELL} -x {}",
            single_quote(&self.emulated_path(descriptor.packages_dir())),
            single_quote(&self.emulated_path(descriptor.jobs_dir())),
            single_quote(&self.path_variable()),
            single_quote(&self.emulated_path(descriptor.executable())),
        )
    }

    pub(super) fn command(&self, descriptor: &PluginDescriptor, stdin: Vec<u8>) -> CommandSpec {
        CommandSpec::new(self.shell.clone())
            .with_arg("-c")
            .with_arg(self.script(descriptor))
            .with_stdin(stdin)
    }
}

/// Converts separators and drive prefixes: `C:\a\b` becomes `/c/a/b`.
fn emulation_layout(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    let mut chars = slashed.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            let rest = chars.as_str().trim_start_matches('/');
            let letter = drive.to_ascii_lowercase();
            if rest.is_empty() {
                format!("/{letter}")
            } else {
                format!("/{letter}/{rest}")
            }
        }
        _ => slashed,
    }
}

fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
