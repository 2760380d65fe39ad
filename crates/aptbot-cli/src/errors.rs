//! Error types for the CLI runtime.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid channel name '{name}': {reason}")]
    InvalidChannel { name: String, reason: &'static str },
    #[error("failed to update channel directory {path}: {source}")]
    ChannelDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to daemon at {address}: {source}")]
    Connect {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to send request to daemon: {0}")]
    SendRequest(#[source] io::Error),
    #[error("failed to read reply from daemon: {0}")]
    ReadReply(#[source] io::Error),
    #[error("daemon closed the connection without replying")]
    MissingReply,
    #[error("daemon rejected the request: {0}")]
    Rejected(String),
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] io::Error),
}
