//! Translation of subcommands into control requests.

use std::io::Write;

use camino::Utf8Path;

use aptbot_control::ControlRequest;

use crate::AppError;
use crate::channels::{Enabled, disable_channel, enable_channel, validate_channel};
use crate::cli::CliCommand;

/// Applies the local side effects of `command` and returns the request to
/// send. Notices about the channel directory go to `stderr`.
pub(crate) fn prepare<E: Write>(
    command: CliCommand,
    channels_dir: &Utf8Path,
    stderr: &mut E,
) -> Result<ControlRequest, AppError> {
    match command {
        CliCommand::EnableChannel { name } => {
            validate_channel(&name)?;
            let notice = match enable_channel(channels_dir, &name)? {
                Enabled::Existing => None,
                Enabled::Restored => Some("restored"),
                Enabled::Created => Some("created"),
            };
            if let Some(action) = notice {
                writeln!(stderr, "{action} {}", channels_dir.join(&name))
                    .map_err(AppError::WriteOutput)?;
            }
            Ok(ControlRequest::join(name))
        }
        CliCommand::DisableChannel { name } => {
            validate_channel(&name)?;
            if !disable_channel(channels_dir, &name)? {
                writeln!(stderr, "channel {name} is already disabled")
                    .map_err(AppError::WriteOutput)?;
            }
            Ok(ControlRequest::part(name))
        }
        CliCommand::Send { channel, message } => {
            validate_channel(&channel)?;
            Ok(ControlRequest::send(channel, message.join(" ")))
        }
        CliCommand::Update => Ok(ControlRequest::update()),
        CliCommand::Kill => Ok(ControlRequest::kill()),
    }
}
