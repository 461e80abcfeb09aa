//! Call runner orchestrating one plugin call end to end.
//!
//! [`CallRunner`] is the public entry point. Each call encodes the request,
//! asks the [`InvocationStrategy`] for a command, hands it to a
//! [`ProcessExecutor`] exactly once, and decodes the reply. The runner keeps
//! no state between calls beyond its immutable descriptor and strategy, so a
//! shared runner may serve concurrent callers.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::context::CallContext;
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;
use crate::invocation::InvocationStrategy;
use crate::process::ProcessExecutor;
use crate::protocol::{CallOutput, CallRequest, decode_output};

/// Tracing target for call orchestration.
const PLUGCALL_TARGET: &str = "plugcall::runner";

/// Issues synchronous calls to a provider plugin.
///
/// # Example
///
/// ```
/// use plugcall::{CallContext, CallRunner, PluginDescriptor};
/// use plugcall::process::{CommandSpec, ExecutionError, ProcessExecutor, ProcessOutput};
/// use std::path::PathBuf;
///
/// struct CannedExecutor;
///
/// impl ProcessExecutor for CannedExecutor {
///     fn run(&self, _command: &CommandSpec) -> Result<ProcessOutput, ExecutionError> {
///         Ok(ProcessOutput::success(r#"{"result":"fake-cid"}"#))
///     }
/// }
///
/// let descriptor = PluginDescriptor::for_job(
///     PathBuf::from("/jobs/cpi"),
///     PathBuf::from("/jobs"),
///     PathBuf::from("/packages"),
/// );
/// let runner = CallRunner::new(descriptor, CannedExecutor);
/// let context = CallContext::new("fake-director-id");
/// let output = runner.run(&context, "create_stemcell", &["image-path"]).unwrap();
/// assert_eq!(output.result(), "fake-cid");
/// assert!(output.error().is_none());
/// ```
#[derive(Debug)]
pub struct CallRunner<E> {
    descriptor: Arc<PluginDescriptor>,
    strategy: InvocationStrategy,
    executor: E,
}

impl<E> CallRunner<E> {
    /// Creates a runner using the invocation strategy for this host.
    #[must_use]
    pub fn new(descriptor: impl Into<Arc<PluginDescriptor>>, executor: E) -> Self {
        Self::with_strategy(descriptor, InvocationStrategy::for_host(), executor)
    }

    /// Creates a runner with an explicit invocation strategy.
    #[must_use]
    pub fn with_strategy(
        descriptor: impl Into<Arc<PluginDescriptor>>,
        strategy: InvocationStrategy,
        executor: E,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            strategy,
            executor,
        }
    }

    /// Returns the plugin descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Returns the invocation strategy.
    #[must_use]
    pub const fn strategy(&self) -> &InvocationStrategy {
        &self.strategy
    }

    /// Returns the process executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: ProcessExecutor> CallRunner<E> {
    /// Calls `method` on the plugin with the given arguments.
    ///
    /// `Ok` means the plugin ran and replied; the returned output may still
    /// carry a domain error in [`CallOutput::error`], which this method never
    /// inspects.
    ///
    /// # Errors
    ///
    /// Returns a construction error ([`PluginError::EmptyMethod`],
    /// [`PluginError::SerializeRequest`]) before any process is spawned, or
    /// a transport error when the plugin cannot be run, exits unsuccessfully,
    /// or replies with output that does not decode.
    pub fn run<A: Serialize>(
        &self,
        context: &CallContext,
        method: &str,
        arguments: &[A],
    ) -> Result<CallOutput, PluginError> {
        let request = CallRequest::from_serializable(method, arguments, context.clone())?;
        self.send(&request)
    }

    /// Sends a prepared request to the plugin.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`CallRunner::run`].
    pub fn send(&self, request: &CallRequest) -> Result<CallOutput, PluginError> {
        let payload = request.encode()?;
        let executable = self.descriptor.executable();

        debug!(
            target: PLUGCALL_TARGET,
            method = request.method(),
            strategy = self.strategy.name(),
            executable = %executable.display(),
            request = %String::from_utf8_lossy(&payload),
            "calling plugin"
        );

        let command = self.strategy.build(&self.descriptor, payload);
        let output = self
            .executor
            .run(&command)
            .map_err(|source| PluginError::Execution {
                executable: executable.to_path_buf(),
                source,
            })?;

        debug!(
            target: PLUGCALL_TARGET,
            method = request.method(),
            exit_code = ?output.exit_code,
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "plugin exited"
        );

        let decoded = decode_output(executable, &output)?;
        if !decoded.log().is_empty() {
            debug!(
                target: PLUGCALL_TARGET,
                method = request.method(),
                plugin_log = decoded.log(),
                "plugin log"
            );
        }
        Ok(decoded)
    }
}
