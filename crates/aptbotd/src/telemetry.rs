//! Global `tracing` subscriber for the daemon.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use aptbot_config::{LogFormat, LogSettings};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("invalid log filter `{directive}`: {message}")]
    Filter {
        /// Directive as configured.
        directive: String,
        /// Parser message.
        message: String,
    },
    /// Another subscriber was installed first.
    #[error("failed to install log subscriber: {0}")]
    Install(#[source] SetGlobalDefaultError),
}

/// Installs the stderr subscriber described by `settings`.
///
/// Only the first call installs anything; later calls succeed without
/// touching the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or the global
/// subscriber is already owned by someone else.
pub fn initialise(settings: &LogSettings) -> Result<(), TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(settings)?;
            tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Install)
        })
        .map(|_| ())
}

fn build_subscriber(
    settings: &LogSettings,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(settings.filter()).map_err(|error| TelemetryError::Filter {
        directive: settings.filter().to_owned(),
        message: error.to_string(),
    })?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    Ok(match settings.format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}
