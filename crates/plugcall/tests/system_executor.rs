#![cfg(unix)]
//! Integration tests running real script plugins through the system executor.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use plugcall::process::{ExecutionError, SystemExecutor};
use plugcall::{CallContext, CallRunner, InvocationStrategy, PluginDescriptor, PluginError, ShellWrapped};
use serde_json::json;
use tempfile::TempDir;

// Writing an executable while another test thread forks can leave the file
// busy (ETXTBSY) for the child; serialise the write-then-spawn sequence.
static SPAWN_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const EXPECTED_REQUEST: &str = concat!(
    r#"{"method":"fake-method","#,
    r#""arguments":["fake-argument-1","fake-argument-2"],"#,
    r#""context":{"director_uuid":"fake-director-id"}}"#,
);

const ENV_REPORTING_PLUGIN: &str = r#"#!/bin/sh
cat > "$BOSH_JOBS_DIR/request.json"
printf '{"result":{"packages":"%s","jobs":"%s","path":"%s","home":"%s","cargo":"%s"},"log":"ran"}' \
  "$BOSH_PACKAGES_DIR" "$BOSH_JOBS_DIR" "$PATH" "${HOME:-}" "${CARGO_PKG_NAME:-}"
"#;

struct Fixture {
    _temp: TempDir,
    jobs: PathBuf,
    packages: PathBuf,
    _guard: MutexGuard<'static, ()>,
}

impl Fixture {
    fn new() -> Self {
        let guard = SPAWN_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let temp = TempDir::new().expect("temp dir");
        let jobs = temp.path().join("jobs");
        let packages = temp.path().join("packages");
        fs::create_dir_all(jobs.join("cpi").join("bin")).expect("jobs dir");
        fs::create_dir_all(&packages).expect("packages dir");
        Self {
            _temp: temp,
            jobs,
            packages,
            _guard: guard,
        }
    }

    fn install_plugin(&self, script: &str) -> PluginDescriptor {
        let descriptor =
            PluginDescriptor::for_job(self.jobs.join("cpi"), self.jobs.clone(), self.packages.clone());
        write_executable(descriptor.executable(), script);
        descriptor
    }
}

fn write_executable(path: &Path, script: &str) {
    fs::write(path, script).expect("write plugin");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod plugin");
}

fn context() -> CallContext {
    CallContext::new("fake-director-id")
}

#[test]
fn direct_plugin_sees_only_the_isolated_environment() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin(ENV_REPORTING_PLUGIN);
    let runner =
        CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let output = runner
        .run(&context(), "fake-method", &["fake-argument-1", "fake-argument-2"])
        .expect("call succeeds");

    assert_eq!(
        output.result(),
        &json!({
            "packages": fixture.packages.to_string_lossy(),
            "jobs": fixture.jobs.to_string_lossy(),
            "path": "/usr/local/bin:/usr/bin:/bin:/sbin",
            "home": "",
            "cargo": "",
        })
    );
    assert_eq!(output.log(), "ran");
    let request = fs::read_to_string(fixture.jobs.join("request.json")).expect("request file");
    assert_eq!(request, EXPECTED_REQUEST);
}

#[test]
fn shell_wrapped_plugin_receives_the_same_contract() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin(ENV_REPORTING_PLUGIN);
    let strategy = InvocationStrategy::ShellWrapped(
        ShellWrapped::new(PathBuf::from("/"))
            .with_shell("/bin/bash")
            .with_tool_dirs(Vec::new()),
    );
    let runner = CallRunner::with_strategy(descriptor, strategy, SystemExecutor::new());

    let output = runner
        .run(&context(), "fake-method", &["fake-argument-1", "fake-argument-2"])
        .expect("call succeeds");

    assert_eq!(output.result()["packages"], &*fixture.packages.to_string_lossy());
    assert_eq!(output.result()["jobs"], &*fixture.jobs.to_string_lossy());
    assert_eq!(output.result()["path"], "/usr/local/bin:/usr/bin:/bin:/sbin");
    let request = fs::read_to_string(fixture.jobs.join("request.json")).expect("request file");
    assert_eq!(request, EXPECTED_REQUEST);
}

#[test]
fn domain_error_survives_a_real_process() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin(
        "#!/bin/sh\ncat > /dev/null\necho '{\"result\":\"fake-cid\",\"error\":{\"message\":\"fake-run-error\",\"ok_to_retry\":true}}'\n",
    );
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let output = runner
        .run(&context(), "create_vm", &["agent"])
        .expect("domain errors are data");
    let error = output.error().expect("domain error");
    assert_eq!(error.message(), "fake-run-error");
    assert!(error.ok_to_retry());
}

#[test]
fn non_zero_exit_reports_status_and_stderr() {
    let fixture = Fixture::new();
    let descriptor =
        fixture.install_plugin("#!/bin/sh\necho '{\"result\":\"fake-cid\"}'\necho boom >&2\nexit 3\n");
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let err = runner
        .run(&context(), "create_vm", &["agent"])
        .expect_err("exit failure");
    match err {
        PluginError::NonZeroExit { status, stderr, .. } => {
            assert_eq!(status, 3);
            assert_eq!(stderr, "boom");
        }
        other => panic!("expected NonZeroExit, got: {other}"),
    }
}

#[test]
fn missing_executable_is_a_spawn_failure() {
    let fixture = Fixture::new();
    let descriptor = PluginDescriptor::for_job(
        fixture.jobs.join("absent"),
        fixture.jobs.clone(),
        fixture.packages.clone(),
    );
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let err = runner
        .run(&context(), "create_vm", &["agent"])
        .expect_err("spawn failure");
    assert!(
        matches!(
            err,
            PluginError::Execution {
                source: ExecutionError::Spawn { .. },
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn plugin_outliving_the_deadline_is_killed() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin("#!/bin/sh\nexec sleep 5\n");
    let executor = SystemExecutor::with_timeout(Duration::from_millis(200));
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, executor);

    let start = Instant::now();
    let err = runner
        .run(&context(), "create_vm", &["agent"])
        .expect_err("timeout");
    assert!(start.elapsed() < Duration::from_secs(4), "call was not cut short");
    assert!(
        matches!(
            err,
            PluginError::Execution {
                source: ExecutionError::Timeout { .. },
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn deadline_reaches_commands_forked_by_the_plugin() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin("#!/bin/sh\nsleep 6\necho '{}'\n");
    let executor = SystemExecutor::with_timeout(Duration::from_millis(200));
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, executor);

    let start = Instant::now();
    let err = runner
        .run(&context(), "create_vm", &["agent"])
        .expect_err("timeout");
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "forked sleep kept the call alive for {:?}",
        start.elapsed()
    );
    assert!(
        matches!(
            err,
            PluginError::Execution {
                source: ExecutionError::Timeout { .. },
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn plugin_ignoring_a_large_request_still_replies() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin("#!/bin/sh\necho '{\"result\":\"ignored\"}'\n");
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let payload = "x".repeat(1 << 20);
    let output = runner
        .run(&context(), "create_vm", &[payload])
        .expect("broken stdin pipe is tolerated");
    assert_eq!(output.result(), "ignored");
}

#[test]
fn large_output_is_fully_drained() {
    let fixture = Fixture::new();
    let descriptor = fixture.install_plugin(
        "#!/bin/sh\ncat > /dev/null\nprintf '{\"result\":\"'\nhead -c 300000 /dev/zero | tr '\\000' a\nprintf '\"}'\n",
    );
    let runner = CallRunner::with_strategy(descriptor, InvocationStrategy::Direct, SystemExecutor::new());

    let output = runner
        .run(&context(), "create_vm", &["agent"])
        .expect("call succeeds");
    assert_eq!(output.result().as_str().map(str::len), Some(300_000));
}
