//! Discovery of channel names on disk.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::debug;

use super::REGISTRY_TARGET;

const HIDDEN_MARKER: char = '.';

/// Errors raised while listing channels.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The channel root could not be listed.
    #[error("failed to list channels in {path}: {source}")]
    Read {
        /// Channel root.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Source of active channel names.
pub trait ChannelDirectory: Send + Sync {
    /// Lists every active channel, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the listing fails.
    fn channel_names(&self) -> Result<Vec<String>, DirectoryError>;
}

/// One sub-directory per channel below a root. Names starting with `.` are
/// hidden and count as disabled.
#[derive(Debug, Clone)]
pub struct FsChannelDirectory {
    root: Utf8PathBuf,
}

impl FsChannelDirectory {
    /// Builds a directory rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_error(&self, source: io::Error) -> DirectoryError {
        DirectoryError::Read {
            path: self.root.clone(),
            source,
        }
    }
}

impl ChannelDirectory for FsChannelDirectory {
    fn channel_names(&self) -> Result<Vec<String>, DirectoryError> {
        let entries = match self.root.read_dir_utf8() {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(
                    target: REGISTRY_TARGET,
                    root = %self.root,
                    "channel root does not exist; no channels"
                );
                return Ok(Vec::new());
            }
            Err(error) => return Err(self.read_error(error)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| self.read_error(error))?;
            let is_dir = entry
                .file_type()
                .map_err(|error| self.read_error(error))?
                .is_dir();
            let name = entry.file_name();
            if is_dir && !name.starts_with(HIDDEN_MARKER) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
