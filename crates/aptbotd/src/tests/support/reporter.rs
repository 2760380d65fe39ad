//! Test double for [`HealthReporter`] that records lifecycle events for
//! assertions.

use std::sync::Mutex;

use aptbot_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::{HealthReporter, ShutdownCause};
use crate::process::LaunchError;
use crate::registry::ReloadReport;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    SessionReady(String),
    RegistryReloaded { loaded: Vec<String>, failed: Vec<String> },
    ShutdownStarted(ShutdownCause),
    LaunchFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_ready(&self, nick: &str) {
        self.record(HealthEvent::SessionReady(nick.to_owned()));
    }

    fn registry_reloaded(&self, report: &ReloadReport) {
        self.record(HealthEvent::RegistryReloaded {
            loaded: report.loaded.clone(),
            failed: report.failed.clone(),
        });
    }

    fn shutdown_started(&self, cause: ShutdownCause) {
        self.record(HealthEvent::ShutdownStarted(cause));
    }

    fn launch_failed(&self, error: &LaunchError) {
        self.record(HealthEvent::LaunchFailed(error.to_string()));
    }
}
