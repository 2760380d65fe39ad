//! Account credentials for the chat service.
//!
//! The token is wrapped in [`SecretToken`] so that it never appears in
//! `Debug` output or log lines.

use std::fmt;

use thiserror::Error;

use crate::Config;

/// Environment variable carrying the bot nickname.
pub const NICK_VARIABLE: &str = "APTBOT_NICK";

/// Environment variable carrying the OAuth token.
pub const PASS_VARIABLE: &str = "APTBOT_PASS";

const OAUTH_PREFIX: &str = "oauth:";

/// OAuth token whose value is redacted when formatted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wraps a token, dropping an `oauth:` prefix when present.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        match token.strip_prefix(OAUTH_PREFIX) {
            Some(stripped) => Self(stripped.to_owned()),
            None => Self(token),
        }
    }

    /// Returns the raw token. Callers must not log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SecretToken(***)")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("***")
    }
}

/// Nickname and token used for the authentication handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    nick: String,
    token: SecretToken,
}

impl Credentials {
    /// Builds credentials from raw values.
    #[must_use]
    pub fn new(nick: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            token: SecretToken::new(token),
        }
    }

    /// Extracts credentials from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Missing`] naming every absent or blank
    /// variable.
    pub fn from_config(config: &Config) -> Result<Self, CredentialsError> {
        let nick = non_blank(config.nick.as_deref());
        let pass = non_blank(config.pass.as_deref());
        match (nick, pass) {
            (Some(nick), Some(pass)) => Ok(Self::new(nick, pass)),
            (nick, pass) => {
                let mut variables = Vec::new();
                if nick.is_none() {
                    variables.push(NICK_VARIABLE);
                }
                if pass.is_none() {
                    variables.push(PASS_VARIABLE);
                }
                Err(CredentialsError::Missing { variables })
            }
        }
    }

    /// Nickname presented to the service.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// OAuth token.
    #[must_use]
    pub const fn token(&self) -> &SecretToken {
        &self.token
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Errors raised while resolving credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    /// One or both credential variables were not set.
    #[error("credentials are not configured; set {}", .variables.join(" and "))]
    Missing {
        /// Names of the variables that must be provided.
        variables: Vec<&'static str>,
    },
}
