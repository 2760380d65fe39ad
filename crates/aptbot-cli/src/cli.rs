//! CLI argument definitions for the aptbot client.

use clap::{Parser, Subcommand};

/// Control client for the aptbot relay daemon.
#[derive(Parser, Debug)]
#[command(name = "aptbot", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// One control action per invocation.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Creates or restores a channel directory and joins the channel.
    EnableChannel {
        /// Channel name without the leading `#`.
        name: String,
    },
    /// Hides a channel directory and leaves the channel.
    DisableChannel {
        /// Channel name without the leading `#`.
        name: String,
    },
    /// Sends a chat message to a joined channel.
    Send {
        /// Target channel.
        channel: String,
        /// Message words, joined with single spaces.
        #[arg(
            value_name = "MESSAGE",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        message: Vec<String>,
    },
    /// Reloads every channel handler.
    Update,
    /// Stops the daemon.
    Kill,
}
