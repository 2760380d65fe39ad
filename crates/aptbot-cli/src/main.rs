//! CLI entrypoint for the aptbot control client.
//!
//! The binary delegates to [`aptbot_cli::run`], which loads configuration,
//! applies any channel directory change and sends one control request to the
//! running daemon.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    aptbot_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
