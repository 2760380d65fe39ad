//! Structured representation of one inbound protocol line.

use std::collections::HashMap;

use strum::{Display, EnumString, IntoStaticStr};

const AUTH_FAILURE_NOTICES: [&str; 2] = [
    "Login authentication failed",
    "Improperly formatted auth",
];

/// Protocol commands the daemon turns into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Command {
    /// A chat message.
    Privmsg,
    /// A user joined a channel.
    Join,
    /// A user left a channel.
    Part,
    /// Channel settings changed.
    RoomState,
    /// Subscription, raid and similar channel notices.
    UserNotice,
    /// State of the bot user in a channel.
    UserState,
    /// Chat was cleared or a user was timed out.
    ClearChat,
    /// A single message was deleted.
    #[strum(serialize = "CLEARMSG")]
    ClearMessage,
    /// A channel started or stopped hosting.
    HostTarget,
    /// Informational notice from the service.
    Notice,
    /// The service asks the client to reconnect.
    Reconnect,
    /// State of the bot user after authentication.
    GlobalUserState,
}

/// One parsed inbound line. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    tags: HashMap<String, String>,
    nick: String,
    command: Option<Command>,
    channel: String,
    body: String,
}

impl Event {
    /// Builds an event for `command` addressed to `channel`.
    #[must_use]
    pub fn new(command: Command, channel: impl Into<String>) -> Self {
        Self {
            command: Some(command),
            channel: channel.into(),
            ..Self::default()
        }
    }

    /// Builds the synthetic event handed to a channel's background task. It
    /// carries only the channel name.
    #[must_use]
    pub fn for_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }

    /// Replaces the tag map.
    #[must_use]
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the sender nickname.
    #[must_use]
    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = nick.into();
        self
    }

    /// Sets the trailing text.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// All tags attached to the line.
    #[must_use]
    pub const fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Looks up a single tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Sender nickname, empty when the prefix carried none.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Protocol command, absent only for synthetic events.
    #[must_use]
    pub const fn command(&self) -> Option<Command> {
        self.command
    }

    /// Channel name without `#`, empty for connection-scoped lines.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whitespace-collapsed trailing text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether this is the notice the service sends when it rejects the
    /// credentials.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        self.command == Some(Command::Notice)
            && self.channel.is_empty()
            && AUTH_FAILURE_NOTICES.contains(&self.body.as_str())
    }
}
