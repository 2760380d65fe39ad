use std::env;
use std::time::Duration;

use camino::Utf8PathBuf;

/// Chat endpoint used when none is configured.
pub const DEFAULT_SERVER: &str = "ircs://irc.chat.twitch.tv:6697";

/// Loopback port of the control plane.
pub const DEFAULT_CONTROL_PORT: u16 = 26538;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Number of reconnect attempts before the daemon gives up.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// First reconnect delay; each further attempt doubles it.
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Size of the per-message handler worker pool.
pub const DEFAULT_HANDLER_WORKERS: usize = 8;

/// Pause between control-plane accept cycles.
pub const DEFAULT_CONTROL_POLL: Duration = Duration::from_secs(1);

/// Delay before the process exits after a fatal startup condition.
pub const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(3);

const APP_DIRECTORY: &str = "aptbot";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Directory holding one sub-directory per channel handler unit.
///
/// Resolves to `$XDG_CONFIG_HOME/aptbot` (or the platform equivalent) and
/// falls back to the temporary directory when no config directory exists.
pub fn default_channels_dir() -> Utf8PathBuf {
    let base = dirs::config_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.join(APP_DIRECTORY)
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
