//! Unified error surface for daemon launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::control::ControlError;
use crate::registry::DirectoryError;
use crate::session::{SessionError, TransportError};

/// Errors that end the daemon with a failure exit status.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry, credentials or endpoint resolution failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Installing the termination signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Signals {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The control socket could not be bound.
    #[error(transparent)]
    Control(#[from] ControlError),
    /// The chat stream could not be configured.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Connecting or authenticating to the chat service failed.
    #[error("failed to start chat session: {source}")]
    Session {
        /// Underlying session error.
        #[source]
        source: SessionError,
    },
    /// The channel directory could not be listed.
    #[error(transparent)]
    Channels(#[from] DirectoryError),
    /// A daemon thread could not be spawned.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// Thread role.
        role: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The dispatcher stopped because the session failed for good.
    #[error("chat session lost: {source}")]
    SessionLost {
        /// Error that ended dispatch.
        #[source]
        source: SessionError,
    },
    /// The dispatcher thread panicked.
    #[error("dispatcher thread panicked")]
    DispatcherPanicked,
}
