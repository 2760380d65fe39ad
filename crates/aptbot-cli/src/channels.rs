//! Channel directory management for `enable-channel` and `disable-channel`.
//!
//! A channel is active when `<root>/<name>` exists and hidden when it has been
//! renamed to `<root>/.<name>`; the daemon skips hidden directories.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::AppError;

/// Script file the daemon loads for each channel.
pub(crate) const HANDLER_FILE: &str = "main.lua";

const TEMPLATE: &str = include_str!("../templates/main.lua");

/// Checks that `name` can be used both as a directory name and as a control
/// request field.
pub(crate) fn validate_channel(name: &str) -> Result<(), AppError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('.') {
        Some("name must not start with '.'")
    } else if name.contains(['/', '\\']) {
        Some("name must not contain path separators")
    } else if name.contains(char::is_whitespace) {
        Some("name must not contain whitespace")
    } else if name.contains(aptbot_control::FIELD_SEPARATOR) {
        Some("name must not contain the field separator")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(AppError::InvalidChannel {
            name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Whether enabling created anything new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enabled {
    /// The directory already existed.
    Existing,
    /// A hidden directory was restored.
    Restored,
    /// A new directory was created.
    Created,
}

/// Makes `<root>/<name>` active, restoring a hidden copy if there is one, and
/// seeds the handler template when the directory has no script yet.
pub(crate) fn enable_channel(root: &Utf8Path, name: &str) -> Result<Enabled, AppError> {
    let dir = open_root(root)?;
    let hidden = hidden_name(name);
    let failed = |path: &str| {
        let path = root.join(path);
        move |source: io::Error| AppError::ChannelDirectory { path, source }
    };

    let enabled = if dir.is_dir(name) {
        Enabled::Existing
    } else if dir.is_dir(&hidden) {
        dir.rename(&hidden, &dir, name).map_err(failed(&hidden))?;
        Enabled::Restored
    } else {
        dir.create_dir(name).map_err(failed(name))?;
        Enabled::Created
    };

    let script = format!("{name}/{HANDLER_FILE}");
    if !dir.exists(&script) {
        dir.write(&script, TEMPLATE).map_err(failed(&script))?;
    }
    Ok(enabled)
}

/// Hides `<root>/<name>`. Returns `false` when there was no active
/// directory to hide.
pub(crate) fn disable_channel(root: &Utf8Path, name: &str) -> Result<bool, AppError> {
    if !root.is_dir() {
        return Ok(false);
    }
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|source| {
        AppError::ChannelDirectory {
            path: root.to_owned(),
            source,
        }
    })?;
    if !dir.is_dir(name) {
        return Ok(false);
    }
    dir.rename(name, &dir, hidden_name(name))
        .map_err(|source| AppError::ChannelDirectory {
            path: root.join(name),
            source,
        })?;
    Ok(true)
}

fn open_root(root: &Utf8Path) -> Result<Dir, AppError> {
    let failed = |source| AppError::ChannelDirectory {
        path: Utf8PathBuf::from(root),
        source,
    };
    Dir::create_ambient_dir_all(root, ambient_authority()).map_err(failed)?;
    Dir::open_ambient_dir(root, ambient_authority()).map_err(failed)
}

fn hidden_name(name: &str) -> String {
    format!(".{name}")
}
