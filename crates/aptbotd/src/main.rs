//! Entry point for the `aptbotd` binary.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match aptbotd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "aptbotd: {error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}
