//! Crate-level test doubles and BDD tests.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use mockall::mock;
use serde_json::json;

use crate::descriptor::PluginDescriptor;
use crate::process::{CommandSpec, ExecutionError, ProcessExecutor, ProcessOutput};
use crate::protocol::CallOutput;
use crate::runner::CallRunner;


mock! {
    pub Executor {}
    impl ProcessExecutor for Executor {
        fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ExecutionError>;
    }
}

/// Descriptor matching the conventional job layout used across tests.
pub(crate) fn job_descriptor() -> PluginDescriptor {
    PluginDescriptor::for_job(
        PathBuf::from("/jobs/cpi"),
        PathBuf::from("/jobs"),
        PathBuf::from("/packages"),
    )
}

/// Executor that replies once with `stdout` and exit status zero.
pub(crate) fn replying_executor(stdout: impl Into<String>) -> MockExecutor {
    let body = stdout.into();
    let mut executor = MockExecutor::new();
    executor
        .expect_run()
        .once()
        .returning(move |_command| Ok(ProcessOutput::success(body.clone())));
    executor
}

/// Executor that fails once as if the process could not be started.
pub(crate) fn spawn_failure_executor(cause: impl Into<String>) -> MockExecutor {
    let message = cause.into();
    let mut executor = MockExecutor::new();
    executor.expect_run().once().returning(move |command| {
        Err(ExecutionError::Spawn {
            program: command.program().to_path_buf(),
            source: Arc::new(io::Error::other(message.clone())),
        })
    });
    executor
}

/// Executor that reports a non-zero exit alongside a well-formed body.
pub(crate) fn failing_exit_executor(status: i32) -> MockExecutor {
    let mut executor = MockExecutor::new();
    executor.expect_run().once().returning(move |_command| {
        Ok(ProcessOutput {
            stdout: br#"{"result":"fake-cid"}"#.to_vec(),
            stderr: b"plugin crashed".to_vec(),
            exit_code: Some(status),
        })
    });
    executor
}

/// Executor that must never be called.
pub(crate) fn unused_executor() -> MockExecutor {
    let mut executor = MockExecutor::new();
    executor.expect_run().never();
    executor
}

#[test]
fn end_to_end_runner_with_stub() {
    let runner = CallRunner::new(
        job_descriptor(),
        replying_executor(r#"{"result":{"vm":"i-123"},"log":"ok"}"#),
    );
    let output = runner
        .run(&crate::CallContext::new("director"), "create_vm", &[json!("agent")])
        .expect("call succeeds");
    assert_eq!(output, CallOutput::new(json!({"vm": "i-123"})).with_log("ok"));
}
