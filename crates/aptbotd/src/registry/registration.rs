//! Channel registrations and the pure reload step.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};

use super::REGISTRY_TARGET;
use crate::handler::{CancellationToken, ChannelHandler, LoadError};

/// Cancellation state of one channel's long-lived task.
///
/// Shared between consecutive registrations of the same channel so a reload
/// never restarts or duplicates the task.
#[derive(Debug, Default)]
pub struct BackgroundTask {
    token: CancellationToken,
    started: AtomicBool,
}

impl BackgroundTask {
    fn new() -> Self {
        Self::default()
    }

    /// Token the running task polls.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the task has been handed to a thread.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Marks the task as started. Returns `false` when it already was.
    pub(crate) fn claim(&self) -> bool {
        !self.started.swap(true, Ordering::SeqCst)
    }
}

/// One active channel.
#[derive(Clone)]
pub struct ChannelRegistration {
    name: String,
    handler: Arc<dyn ChannelHandler>,
    background: Arc<BackgroundTask>,
}

impl ChannelRegistration {
    /// Registers a freshly loaded channel with a new, unstarted task.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: Arc<dyn ChannelHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            background: Arc::new(BackgroundTask::new()),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loaded handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn ChannelHandler> {
        Arc::clone(&self.handler)
    }

    /// Background task state.
    #[must_use]
    pub fn background(&self) -> Arc<BackgroundTask> {
        Arc::clone(&self.background)
    }

    fn with_handler(self, handler: Arc<dyn ChannelHandler>) -> Self {
        Self { handler, ..self }
    }

    /// Signals the background task to stop. Consumes the registration.
    pub(crate) fn retire(self) {
        if self.background.token.cancel() {
            debug!(
                target: REGISTRY_TARGET,
                channel = %self.name,
                "background task cancelled"
            );
        }
    }
}

impl fmt::Debug for ChannelRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistration")
            .field("name", &self.name)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

/// Outcome of one reload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    /// Channels whose handler loaded.
    pub loaded: Vec<String>,
    /// Channels whose handler failed to load.
    pub failed: Vec<String>,
    /// Previously registered channels that were cancelled and removed.
    pub dropped: Vec<String>,
}

impl ReloadReport {
    /// Whether every discovered channel loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handler load outcome for one discovered channel.
pub type LoadOutcome = (String, Result<Arc<dyn ChannelHandler>, LoadError>);

/// Builds the next registration set from `previous` and freshly loaded
/// handlers.
///
/// Channels that loaded keep their previous background task when one
/// existed. Channels that failed to load, and previous channels no longer
/// discovered, are cancelled and left out.
#[must_use]
pub fn rebuild(
    mut previous: BTreeMap<String, ChannelRegistration>,
    loaded: Vec<LoadOutcome>,
) -> (BTreeMap<String, ChannelRegistration>, ReloadReport) {
    let mut next = BTreeMap::new();
    let mut report = ReloadReport::default();

    for (name, outcome) in loaded {
        match outcome {
            Ok(handler) => {
                let registration = match previous.remove(&name) {
                    Some(existing) => existing.with_handler(handler),
                    None => ChannelRegistration::new(name.clone(), handler),
                };
                report.loaded.push(name.clone());
                next.insert(name, registration);
            }
            Err(load_error) => {
                error!(
                    target: REGISTRY_TARGET,
                    channel = %name,
                    error = %load_error,
                    "handler failed to load; channel left unregistered"
                );
                report.failed.push(name);
            }
        }
    }

    for (name, stale) in previous {
        info!(target: REGISTRY_TARGET, channel = %name, "channel unregistered");
        stale.retire();
        report.dropped.push(name);
    }

    (next, report)
}
