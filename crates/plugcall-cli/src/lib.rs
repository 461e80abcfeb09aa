//! Command-line runtime for `plugcall`.
//!
//! The runtime splits configuration flags from the call arguments, resolves
//! [`plugcall_config::Config`], installs telemetry, and performs exactly one
//! plugin call. The call output is written to stdout as a single JSON line.
//! Configuration loading and process execution are injectable so the whole
//! pipeline can be exercised in tests without spawning plugins.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use plugcall::process::{ProcessExecutor, SystemExecutor};
use plugcall::{CallOutput, CallRunner};
use plugcall_config::Config;

mod cli;
mod config;
mod errors;
pub mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
use errors::AppError;

const CLI_TARGET: &str = "plugcall::cli";

/// Exit status reported when the plugin answers with a domain error.
pub const DOMAIN_ERROR_EXIT: u8 = 2;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(args, stdout, stderr, &OrthoConfigLoader, system_executor)
}

fn system_executor(config: &Config) -> SystemExecutor {
    config
        .timeout()
        .map_or_else(SystemExecutor::new, SystemExecutor::with_timeout)
}

pub(crate) fn run_with<I, W, E, L, F, X>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
    make_executor: F,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    F: FnOnce(&Config) -> X,
    X: ProcessExecutor,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match execute(&args, stdout, loader, make_executor) {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) => report_usage(&error, stdout, stderr),
        Err(error) => {
            tracing::error!(target: CLI_TARGET, %error, "plugin call failed");
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W, L, F, X>(
    args: &[OsString],
    stdout: &mut W,
    loader: &L,
    make_executor: F,
) -> Result<ExitCode, AppError>
where
    W: Write,
    L: ConfigLoader,
    F: FnOnce(&Config) -> X,
    X: ProcessExecutor,
{
    let split = split_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let runner = CallRunner::new(config.plugin_descriptor()?, make_executor(&config));
    let output = runner.run(&config.call_context(), &cli.method, &cli.call_arguments())?;
    write_output(stdout, &output)?;

    Ok(match output.error() {
        Some(_) => ExitCode::from(DOMAIN_ERROR_EXIT),
        None => ExitCode::SUCCESS,
    })
}

fn write_output<W: Write>(stdout: &mut W, output: &CallOutput) -> Result<(), AppError> {
    serde_json::to_writer(&mut *stdout, output).map_err(AppError::Encode)?;
    writeln!(stdout).map_err(AppError::Output)?;
    stdout.flush().map_err(AppError::Output)
}

fn report_usage<W: Write, E: Write>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode {
    // Help and version requests are not failures.
    if error.use_stderr() {
        let _ = write!(stderr, "{}", error.render());
        ExitCode::FAILURE
    } else {
        let _ = write!(stdout, "{}", error.render());
        ExitCode::SUCCESS
    }
}
