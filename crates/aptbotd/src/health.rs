//! Lifecycle milestones reported to operators.

use std::sync::Arc;

use strum::{Display, IntoStaticStr};

use aptbot_config::Config;

use crate::bootstrap::BootstrapError;
use crate::process::LaunchError;
use crate::registry::ReloadReport;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Why the daemon is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ShutdownCause {
    /// A `KILL` request arrived on the control socket.
    ControlKill,
    /// The process received a termination signal.
    Signal,
    /// The dispatcher stopped on its own.
    DispatcherStopped,
}

/// Observer for daemon lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once configuration, credentials and endpoint are resolved.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after the chat service accepted the credentials.
    fn session_ready(&self, nick: &str);

    /// Invoked after each registry reload.
    fn registry_reloaded(&self, report: &ReloadReport);

    /// Invoked when an orderly shutdown begins.
    fn shutdown_started(&self, cause: ShutdownCause);

    /// Invoked when the daemon is about to exit with an error.
    fn launch_failed(&self, error: &LaunchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_ready(&self, nick: &str) {
        (**self).session_ready(nick);
    }

    fn registry_reloaded(&self, report: &ReloadReport) {
        (**self).registry_reloaded(report);
    }

    fn shutdown_started(&self, cause: ShutdownCause) {
        (**self).shutdown_started(cause);
    }

    fn launch_failed(&self, error: &LaunchError) {
        (**self).launch_failed(error);
    }
}

/// Reporter that emits each milestone as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            control = %config.control_address(),
            channels_dir = %config.channels_dir(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn session_ready(&self, nick: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_ready",
            nick,
            "authenticated with chat service"
        );
    }

    fn registry_reloaded(&self, report: &ReloadReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_reloaded",
            loaded = ?report.loaded,
            failed = ?report.failed,
            dropped = ?report.dropped,
            "channel handlers loaded"
        );
    }

    fn shutdown_started(&self, cause: ShutdownCause) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_started",
            cause = %cause,
            "daemon shutting down"
        );
    }

    fn launch_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "launch_failed",
            error = %error,
            "daemon stopped on a fatal error"
        );
    }
}
