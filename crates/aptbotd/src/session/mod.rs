//! Connection session with the chat service.
//!
//! [`Session`] owns the transport and performs the authentication handshake.
//! It answers keep-alive probes and reconnects with exponential backoff when
//! the stream fails. Other components reach it through [`ChatSession`] and
//! never touch the transport directly.

mod client;
mod errors;
#[cfg(test)]
pub(crate) mod test_support;
mod transport;

pub use client::{ReconnectPolicy, Session};
pub use errors::{SessionError, TransportError};
pub use transport::{Connector, NetworkConnector, Transport};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Handler-facing surface of the connection session.
pub trait ChatSession: Send + Sync {
    /// Nickname the session authenticated as.
    fn nick(&self) -> &str;

    /// Sends one chat line per entry of `lines` to `channel`, in order. When
    /// `reply_to` is set every line carries the reply-association tag.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the session is disconnected or a write
    /// fails.
    fn send_message(
        &self,
        channel: &str,
        lines: &[&str],
        reply_to: Option<&str>,
    ) -> Result<(), SessionError>;

    /// Joins `channel` and records it for re-joining after a reconnect.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the command cannot be sent.
    fn join_channel(&self, channel: &str) -> Result<(), SessionError>;

    /// Leaves `channel`. Returns `false` when it was not joined.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the command cannot be sent.
    fn leave_channel(&self, channel: &str) -> Result<bool, SessionError>;
}

/// Control-plane surface of the connection session.
pub trait SessionControl: ChatSession {
    /// Closes the connection for good; further calls have no effect.
    fn disconnect(&self);
}
