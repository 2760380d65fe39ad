//! Shared configuration for the aptbot daemon and its control client.
//!
//! [`Config`] is loaded once at startup through `ortho_config`, layering
//! defaults, a TOML file, `APTBOT_*` environment variables, and command-line
//! flags. Components receive the resolved value by reference; every optional
//! field has an accessor that applies the documented default.

mod credentials;
mod defaults;
mod logging;
mod server;

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use credentials::{
    Credentials, CredentialsError, NICK_VARIABLE, PASS_VARIABLE, SecretToken,
};
pub use defaults::{
    DEFAULT_CONTROL_POLL, DEFAULT_CONTROL_PORT, DEFAULT_EXIT_GRACE, DEFAULT_HANDLER_WORKERS,
    DEFAULT_LOG_FILTER, DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY, DEFAULT_SERVER,
    default_channels_dir, default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};
pub use server::{ChatServer, ServerParseError, StreamSecurity};

/// Runtime configuration shared by the daemon and the client.
#[derive(Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "APTBOT")]
pub struct Config {
    /// Nickname used to authenticate with the chat service.
    pub nick: Option<String>,
    /// OAuth token, with or without the `oauth:` prefix.
    pub pass: Option<String>,
    /// Chat endpoint URL (`irc://` or `ircs://`).
    pub server: Option<String>,
    /// Loopback port of the control plane.
    pub control_port: Option<u16>,
    /// Root directory of channel handler units.
    pub channels_dir: Option<Utf8PathBuf>,
    /// `tracing` filter directive.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
    /// Reconnect attempts before the daemon gives up.
    pub reconnect_attempts: Option<u32>,
    /// First reconnect delay in milliseconds.
    pub reconnect_base_delay_ms: Option<u64>,
    /// Number of per-message handler workers.
    pub handler_workers: Option<usize>,
    /// Pause between control-plane accept cycles in milliseconds.
    pub control_poll_ms: Option<u64>,
    /// Delay before a fatal exit in milliseconds.
    pub exit_grace_ms: Option<u64>,
}

impl Config {
    /// Resolves the chat endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerParseError`] when the configured URL is malformed.
    pub fn chat_server(&self) -> Result<ChatServer, ServerParseError> {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER).parse()
    }

    /// Resolves the account credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the nickname or token is absent.
    pub fn credentials(&self) -> Result<Credentials, CredentialsError> {
        Credentials::from_config(self)
    }

    /// Loopback address of the control plane.
    #[must_use]
    pub fn control_address(&self) -> SocketAddr {
        let port = self.control_port.unwrap_or(DEFAULT_CONTROL_PORT);
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
    }

    /// Root directory of channel handler units.
    #[must_use]
    pub fn channels_dir(&self) -> Utf8PathBuf {
        self.channels_dir
            .clone()
            .unwrap_or_else(default_channels_dir)
    }

    /// Log filter and format.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_filter.as_deref(), self.log_format)
    }

    /// Reconnect attempts before the daemon gives up.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.unwrap_or(DEFAULT_RECONNECT_ATTEMPTS)
    }

    /// Delay before the first reconnect attempt.
    #[must_use]
    pub fn reconnect_base_delay(&self) -> Duration {
        self.reconnect_base_delay_ms
            .map_or(DEFAULT_RECONNECT_BASE_DELAY, Duration::from_millis)
    }

    /// Number of per-message handler workers, never less than one.
    #[must_use]
    pub fn handler_workers(&self) -> usize {
        self.handler_workers.unwrap_or(DEFAULT_HANDLER_WORKERS).max(1)
    }

    /// Pause between control-plane accept cycles.
    #[must_use]
    pub fn control_poll_interval(&self) -> Duration {
        self.control_poll_ms
            .map_or(DEFAULT_CONTROL_POLL, Duration::from_millis)
    }

    /// Delay before a fatal exit.
    #[must_use]
    pub fn exit_grace(&self) -> Duration {
        self.exit_grace_ms
            .map_or(DEFAULT_EXIT_GRACE, Duration::from_millis)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("nick", &self.nick)
            .field("pass", &self.pass.as_ref().map(|_| "***"))
            .field("server", &self.server)
            .field("control_port", &self.control_port)
            .field("channels_dir", &self.channels_dir)
            .field("log_filter", &self.log_filter)
            .field("log_format", &self.log_format)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("reconnect_base_delay_ms", &self.reconnect_base_delay_ms)
            .field("handler_workers", &self.handler_workers)
            .field("control_poll_ms", &self.control_poll_ms)
            .field("exit_grace_ms", &self.exit_grace_ms)
            .finish()
    }
}
