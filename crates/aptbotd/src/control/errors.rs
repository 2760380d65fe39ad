//! Errors raised by the control-plane listener.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding the control socket.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to bind control socket at {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking control socket: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("failed to read control socket address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
}
