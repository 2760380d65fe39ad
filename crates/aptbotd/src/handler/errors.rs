//! Errors raised by handler loading and invocation.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading a handler unit.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The channel directory has no handler file.
    #[error("handler file {path} does not exist")]
    Missing {
        /// Expected location of the handler.
        path: Utf8PathBuf,
    },
    /// The handler file could not be read.
    #[error("failed to read handler {path}: {source}")]
    Read {
        /// Handler location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Evaluating the script failed.
    #[error("failed to evaluate handler {path}: {message}")]
    Script {
        /// Handler location.
        path: Utf8PathBuf,
        /// Interpreter error message.
        message: String,
    },
    /// The script does not define a required function.
    #[error("handler {path} does not define `{name}`")]
    MissingEntryPoint {
        /// Handler location.
        path: Utf8PathBuf,
        /// Name of the missing function.
        name: &'static str,
    },
}

/// Errors raised by a handler invocation.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The script raised an error.
    #[error("`{entry_point}` failed for channel {channel}: {message}")]
    Script {
        /// Channel whose handler failed.
        channel: String,
        /// Function that was running.
        entry_point: &'static str,
        /// Interpreter error message.
        message: String,
    },
}
