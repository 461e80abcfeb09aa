//! Synchronous call/response client for provider plugins.
//!
//! The `plugcall` crate lets an orchestrator invoke operations implemented by
//! an external executable without linking against it. Every call spawns the
//! plugin once, writes a compact JSON [`CallRequest`] to its stdin, and reads
//! a JSON [`CallOutput`] from its stdout before the process exits.
//!
//! Failures come in two tiers. A [`PluginError`] means the call mechanism
//! failed: the request could not be built, the process could not be run or
//! exited unsuccessfully, or its reply did not decode. A [`CallError`] inside
//! a successful [`CallOutput`] means the plugin ran and reported that the
//! requested operation failed.
//!
//! # Architecture
//!
//! A [`CallRunner`] owns an immutable [`PluginDescriptor`], an
//! [`InvocationStrategy`] chosen once for the host, and a
//! [`ProcessExecutor`](process::ProcessExecutor). POSIX hosts execute the
//! plugin directly in an isolated environment; hosts running plugins under
//! a POSIX emulation layer go through a shell that exports the environment
//! itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use plugcall::{CallContext, CallRunner, PluginDescriptor};
//! use plugcall::process::SystemExecutor;
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! let descriptor = PluginDescriptor::for_job(
//!     PathBuf::from("/var/vcap/jobs/cpi"),
//!     PathBuf::from("/var/vcap/jobs"),
//!     PathBuf::from("/var/vcap/packages"),
//! );
//! let runner = CallRunner::new(descriptor, SystemExecutor::with_timeout(Duration::from_secs(300)));
//! let context = CallContext::new("director-uuid");
//!
//! match runner.run(&context, "create_stemcell", &["/tmp/image", "{}"]) {
//!     Ok(output) => match output.error() {
//!         Some(error) => eprintln!("plugin reported failure: {error}"),
//!         None => println!("stemcell cid: {}", output.result()),
//!     },
//!     Err(error) => eprintln!("call failed: {error}"),
//! }
//! ```

pub mod context;
pub mod descriptor;
pub mod error;
pub mod invocation;
pub mod process;
pub mod protocol;
pub mod runner;

#[cfg(test)]
mod tests;

pub use self::context::CallContext;
pub use self::descriptor::PluginDescriptor;
pub use self::error::PluginError;
pub use self::invocation::{InvocationStrategy, ShellWrapped};
pub use self::protocol::{CallError, CallOutput, CallRequest};
pub use self::runner::CallRunner;
