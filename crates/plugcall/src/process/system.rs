//! Process execution on the host operating system.

use std::io::{self, Read, Write};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{CommandSpec, ExecutionError, ProcessExecutor, ProcessOutput};

/// Tracing target for process execution.
const PROCESS_TARGET: &str = "plugcall::process";

/// Interval between exit checks while a deadline is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Executes commands with [`std::process::Command`].
///
/// Standard input is written on a scoped worker thread while standard output
/// and standard error are drained on two more, so a plugin that fills one
/// pipe before reading the other cannot deadlock the call. The child is
/// reaped and every pipe is closed before [`ProcessExecutor::run`] returns.
///
/// On Unix the plugin leads its own process group. When the deadline expires
/// the whole group is killed, including any commands a script plugin forked.
///
/// # Example
///
/// ```rust,no_run
/// use plugcall::process::{CommandSpec, ProcessExecutor, SystemExecutor};
/// use std::time::Duration;
///
/// let executor = SystemExecutor::with_timeout(Duration::from_secs(30));
/// let command = CommandSpec::new("/bin/cat").with_stdin(b"hello".to_vec());
/// let output = executor.run(&command).expect("cat runs");
/// assert_eq!(output.stdout, b"hello");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemExecutor {
    timeout: Option<Duration>,
}

impl SystemExecutor {
    /// Creates an executor that waits for the process without a deadline.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Creates an executor that kills processes outliving `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Returns the configured deadline, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn wait(&self, program: &Path, child: &mut Child) -> Result<ExitStatus, ExecutionError> {
        let Some(timeout) = self.timeout else {
            return match child.wait() {
                Ok(status) => Ok(status),
                Err(err) => {
                    terminate(child);
                    Err(io_failure(program, err))
                }
            };
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if start.elapsed() > timeout => {
                    warn!(
                        target: PROCESS_TARGET,
                        program = %program.display(),
                        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        "process exceeded its deadline, killing it"
                    );
                    terminate(child);
                    return Err(ExecutionError::Timeout {
                        program: program.to_path_buf(),
                        timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    terminate(child);
                    return Err(io_failure(program, err));
                }
            }
        }
    }
}

impl ProcessExecutor for SystemExecutor {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ExecutionError> {
        let program = command.program();
        let mut process = Command::new(program);
        process.args(command.args());
        if command.isolated_env() {
            process.env_clear();
        }
        process.envs(command.env());
        // Plugins run in their own process group so a deadline can reach the
        // processes they fork, which would otherwise hold the pipes open.
        #[cfg(unix)]
        process.process_group(0);
        process
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            target: PROCESS_TARGET,
            program = %program.display(),
            isolated_env = command.isolated_env(),
            stdin_bytes = command.stdin().len(),
            "spawning process"
        );

        let mut child = process.spawn().map_err(|err| ExecutionError::Spawn {
            program: program.to_path_buf(),
            source: Arc::new(err),
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let input = command.stdin();

        thread::scope(|scope| {
            let writer = scope.spawn(move || write_input(stdin, input));
            let stdout_reader = scope.spawn(move || read_stream(stdout));
            let stderr_reader = scope.spawn(move || read_stream(stderr));

            // Joining every worker before inspecting any result keeps the
            // pipes scoped to this call on all exit paths.
            let status = self.wait(program, &mut child);
            let written = join(writer);
            let stdout_bytes = join(stdout_reader);
            let stderr_bytes = join(stderr_reader);

            let status = status?;
            written.map_err(|err| io_failure(program, err))?;
            let output = ProcessOutput {
                stdout: stdout_bytes.map_err(|err| io_failure(program, err))?,
                stderr: stderr_bytes.map_err(|err| io_failure(program, err))?,
                exit_code: status.code(),
            };

            debug!(
                target: PROCESS_TARGET,
                program = %program.display(),
                ?status,
                stdout_bytes = output.stdout.len(),
                stderr_bytes = output.stderr.len(),
                "process exited"
            );
            Ok(output)
        })
    }
}

/// Kills the child together with everything it started, then reaps it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child);
    drop(child.kill());
    drop(child.wait());
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(errno) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(
            target: PROCESS_TARGET,
            pid = raw,
            %errno,
            "process group already gone"
        );
    }
}

/// Writes the request and closes the pipe.
///
/// A plugin is free to exit without reading its input, so a broken pipe is
/// not reported.
fn write_input(stdin: Option<ChildStdin>, input: &[u8]) -> io::Result<()> {
    let Some(mut pipe) = stdin else {
        return Ok(());
    };
    match pipe.write_all(input).and_then(|()| pipe.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn read_stream(stream: Option<impl Read>) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = stream {
        reader.read_to_end(&mut buffer)?;
    }
    Ok(buffer)
}

fn join<T>(handle: ScopedJoinHandle<'_, io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe worker thread panicked")))
}

fn io_failure(program: &Path, err: io::Error) -> ExecutionError {
    ExecutionError::Io {
        program: program.to_path_buf(),
        source: Arc::new(err),
    }
}
