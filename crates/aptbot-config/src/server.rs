use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const PLAIN_SCHEME: &str = "irc";
const TLS_SCHEME: &str = "ircs";
const PLAIN_PORT: u16 = 6667;
const TLS_PORT: u16 = 6697;

/// Whether the chat stream is wrapped in TLS.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamSecurity {
    /// Plain TCP stream.
    Plain,
    /// TLS over TCP.
    Tls,
}

/// Address of the remote chat service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatServer {
    host: String,
    port: u16,
    security: StreamSecurity,
}

impl ChatServer {
    /// Builds a plaintext endpoint.
    #[must_use]
    pub fn plain(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: StreamSecurity::Plain,
        }
    }

    /// Builds a TLS endpoint.
    #[must_use]
    pub fn tls(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: StreamSecurity::Tls,
        }
    }

    /// Host name used for both the TCP connection and TLS server name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Stream security mode.
    #[must_use]
    pub const fn security(&self) -> StreamSecurity {
        self.security
    }
}

impl fmt::Display for ChatServer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.security {
            StreamSecurity::Plain => PLAIN_SCHEME,
            StreamSecurity::Tls => TLS_SCHEME,
        };
        write!(formatter, "{scheme}://{}:{}", self.host, self.port)
    }
}

impl FromStr for ChatServer {
    type Err = ServerParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        let (security, default_port) = match url.scheme() {
            PLAIN_SCHEME => (StreamSecurity::Plain, PLAIN_PORT),
            TLS_SCHEME => (StreamSecurity::Tls, TLS_PORT),
            other => return Err(ServerParseError::UnsupportedScheme(other.to_owned())),
        };
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ServerParseError::MissingHost(input.to_owned()))?;
        Ok(Self {
            host: host.to_owned(),
            port: url.port().unwrap_or(default_port),
            security,
        })
    }
}

/// Errors encountered while parsing a [`ChatServer`] from text.
#[derive(Debug, Error)]
pub enum ServerParseError {
    /// Scheme was neither `irc` nor `ircs`.
    #[error("unsupported chat server scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing chat server host in '{0}'")]
    MissingHost(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
