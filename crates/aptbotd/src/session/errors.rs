//! Error types for the chat connection.

use std::io;

use thiserror::Error;

/// Errors raised while opening a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {server}: {source}")]
    Connect {
        /// Endpoint that was dialled.
        server: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The host is not a valid TLS server name.
    #[error("'{host}' is not a valid TLS server name")]
    ServerName {
        /// Offending host.
        host: String,
    },
    /// The TLS client could not be configured or started.
    #[error("failed to set up TLS for {host}: {source}")]
    Tls {
        /// Host the session was meant for.
        host: String,
        /// Underlying TLS error.
        #[source]
        source: rustls::Error,
    },
}

/// Errors surfaced by the connection session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening the transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The chat service rejected the credentials.
    #[error("the chat service rejected the credentials")]
    AuthenticationRejected,
    /// Reading from or writing to the stream failed.
    #[error("failed to {action}: {source}")]
    Io {
        /// What the session was doing.
        action: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The session has no open transport.
    #[error("the chat session is not connected")]
    NotConnected,
    /// Every reconnect attempt failed.
    #[error("gave up reconnecting after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}
