//! Control-plane wire types shared by the aptbot daemon and its client.
//!
//! A request is one line of plain text, `COMMAND===CHANNEL===MESSAGE`, sent
//! over a fresh loopback TCP connection. The daemon answers with a single
//! [`ControlReply`] line and closes the connection.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Delimiter between the three request fields.
pub const FIELD_SEPARATOR: &str = "===";

/// Upper bound on the size of a single request in bytes.
pub const MAX_REQUEST_BYTES: usize = 1024;

/// Commands understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ControlCommand {
    /// Join a channel on the chat service.
    Join,
    /// Unregister a channel's handler and leave it.
    Part,
    /// Send a chat message to a channel.
    Send,
    /// Disconnect and terminate the daemon.
    Kill,
    /// Reload every channel handler from disk.
    Update,
}

/// One decoded control-plane request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    command: ControlCommand,
    channel: String,
    message: String,
}

impl ControlRequest {
    /// Builds a request from its parts.
    #[must_use]
    pub fn new(
        command: ControlCommand,
        channel: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            command,
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// `JOIN` request for `channel`.
    #[must_use]
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new(ControlCommand::Join, channel, "")
    }

    /// `PART` request for `channel`.
    #[must_use]
    pub fn part(channel: impl Into<String>) -> Self {
        Self::new(ControlCommand::Part, channel, "")
    }

    /// `SEND` request carrying `message` for `channel`.
    #[must_use]
    pub fn send(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ControlCommand::Send, channel, message)
    }

    /// `UPDATE` request.
    #[must_use]
    pub fn update() -> Self {
        Self::new(ControlCommand::Update, "", "")
    }

    /// `KILL` request.
    #[must_use]
    pub fn kill() -> Self {
        Self::new(ControlCommand::Kill, "", "")
    }

    /// Decodes a request.
    ///
    /// The input is split into at most three fields, so a message containing
    /// the separator keeps its remainder. The command token is matched after
    /// trimming surrounding whitespace; the channel is trimmed; trailing line
    /// terminators are removed from the message.
    ///
    /// # Errors
    ///
    /// Returns [`ControlParseError::MissingFields`] when fewer than three
    /// fields are present and [`ControlParseError::UnknownCommand`] when the
    /// command token is not recognised.
    pub fn parse(input: &str) -> Result<Self, ControlParseError> {
        let mut fields = input.splitn(3, FIELD_SEPARATOR);
        let (Some(command), Some(channel), Some(message)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(ControlParseError::MissingFields {
                found: input.split(FIELD_SEPARATOR).count(),
            });
        };
        let token = command.trim();
        let parsed = token
            .parse::<ControlCommand>()
            .map_err(|_| ControlParseError::UnknownCommand {
                token: token.to_owned(),
            })?;
        Ok(Self::new(
            parsed,
            channel.trim(),
            message.trim_end_matches(['\r', '\n']),
        ))
    }

    /// Encodes the request in wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.command, self.channel, self.message
        )
    }

    /// Requested command.
    #[must_use]
    pub const fn command(&self) -> ControlCommand {
        self.command
    }

    /// Target channel, empty for connection-wide commands.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Message text, empty unless the command is `SEND`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while decoding a [`ControlRequest`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlParseError {
    /// Fewer than three fields were present.
    #[error("expected 3 fields separated by '===', found {found}")]
    MissingFields {
        /// Number of fields actually present.
        found: usize,
    },
    /// The command token is not one the daemon understands.
    #[error("unknown control command '{token}'")]
    UnknownCommand {
        /// The offending token after trimming.
        token: String,
    },
}

const ACCEPTED: &str = "OK";
const REJECTED: &str = "ERR";

/// Acknowledgement written by the daemon before closing a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    /// The command was carried out.
    Accepted,
    /// The command failed or was only partly carried out.
    Rejected {
        /// Human-readable failure description.
        reason: String,
    },
}

impl ControlReply {
    /// Builds a rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Decodes a reply line. Unrecognised text is treated as a rejection
    /// carrying the text verbatim.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == ACCEPTED {
            return Self::Accepted;
        }
        match line.strip_prefix(REJECTED) {
            Some(reason) => Self::rejected(reason.trim_start()),
            None => Self::rejected(line),
        }
    }

    /// Returns `true` for [`ControlReply::Accepted`].
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for ControlReply {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => formatter.write_str(ACCEPTED),
            Self::Rejected { reason } => write!(formatter, "{REJECTED} {reason}"),
        }
    }
}
