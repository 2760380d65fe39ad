//! Command-line client for the aptbot relay daemon.
//!
//! Each invocation performs one control action: it parses the subcommand,
//! loads the shared configuration to find the control port and channel root,
//! applies any channel directory change and sends a single
//! `COMMAND===CHANNEL===MESSAGE` request. The daemon's acknowledgement is
//! printed on stdout. The runtime takes its IO streams and configuration
//! loader as parameters so tests can substitute both.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use aptbot_control::ControlReply;
use clap::Parser;

mod channels;
mod cli;
mod command;
mod config;
mod errors;
mod transport;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
pub(crate) use errors::AppError;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match execute(args, stdout, stderr, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);
    let cli = Cli::try_parse_from(split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;

    let request = command::prepare(cli.command, &config.channels_dir(), stderr)?;
    let reply = transport::exchange(config.control_address(), &request)?;
    writeln!(stdout, "{reply}").map_err(AppError::WriteOutput)?;
    match reply {
        ControlReply::Accepted => Ok(()),
        ControlReply::Rejected { reason } => Err(AppError::Rejected(reason)),
    }
}
