//! Plugin descriptor describing where a provider plugin lives.
//!
//! A [`PluginDescriptor`] names the plugin executable and the two directories
//! the plugin reads packages and job data from. Descriptors are built once at
//! startup and shared read-only across every call a runner issues.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Conventional location of the plugin executable inside a job directory.
const JOB_EXECUTABLE: [&str; 2] = ["bin", "cpi"];

/// Immutable configuration for a provider plugin.
///
/// # Example
///
/// ```
/// use plugcall::PluginDescriptor;
/// use std::path::PathBuf;
///
/// let descriptor = PluginDescriptor::for_job(
///     PathBuf::from("/jobs/cpi"),
///     PathBuf::from("/jobs"),
///     PathBuf::from("/packages"),
/// );
/// assert_eq!(descriptor.executable(), PathBuf::from("/jobs/cpi/bin/cpi"));
/// assert!(descriptor.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    executable: PathBuf,
    jobs_dir: PathBuf,
    packages_dir: PathBuf,
}

impl PluginDescriptor {
    /// Creates a descriptor from explicit paths.
    #[must_use]
    pub const fn new(executable: PathBuf, jobs_dir: PathBuf, packages_dir: PathBuf) -> Self {
        Self {
            executable,
            jobs_dir,
            packages_dir,
        }
    }

    /// Creates a descriptor whose executable is `<job_dir>/bin/cpi`.
    #[must_use]
    pub fn for_job(job_dir: PathBuf, jobs_dir: PathBuf, packages_dir: PathBuf) -> Self {
        let executable = JOB_EXECUTABLE
            .iter()
            .fold(job_dir, |path, segment| path.join(segment));
        Self::new(executable, jobs_dir, packages_dir)
    }

    /// Returns the plugin executable path.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the jobs directory exposed to the plugin.
    #[must_use]
    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// Returns the packages directory exposed to the plugin.
    #[must_use]
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Validates the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidDescriptor`] if the executable path is
    /// empty or relative. A relative executable would be resolved against
    /// whatever `PATH` the plugin environment carries. Rooted paths without
    /// a drive prefix, such as `\jobs\cpi\bin\cpi`, are accepted because the
    /// shell-wrapped strategy maps them onto the emulation layer's root.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.executable.as_os_str().is_empty() {
            return Err(PluginError::InvalidDescriptor {
                message: String::from("plugin executable path must not be empty"),
            });
        }
        if !self.executable.has_root() {
            return Err(PluginError::InvalidDescriptor {
                message: format!(
                    "plugin executable path must be absolute, got {}",
                    self.executable.display()
                ),
            });
        }
        Ok(())
    }
}
