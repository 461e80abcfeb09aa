//! CLI entrypoint for `plugcall`.
//!
//! The binary delegates to [`plugcall_cli::run`], which loads configuration,
//! installs telemetry, performs one plugin call, and prints the call output.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    plugcall_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
