//! Per-channel handler registry with hot reload.
//!
//! [`HandlerRegistry`] keeps at most one [`ChannelRegistration`] per channel
//! name. [`HandlerRegistry::reload`] rescans the channel directory, loads
//! every handler afresh and carries existing background tasks over so a
//! reload never restarts them. Channels that disappear are cancelled before
//! they are discarded.

mod directory;
mod registration;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

pub use directory::{ChannelDirectory, DirectoryError, FsChannelDirectory};
pub use registration::{
    BackgroundTask, ChannelRegistration, LoadOutcome, ReloadReport, rebuild,
};

use crate::handler::{CancellationToken, ChannelHandler, HandlerLoader};

pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Background task that has been claimed for starting.
#[derive(Clone)]
pub struct BackgroundLaunch {
    /// Channel the task serves.
    pub channel: String,
    /// Handler whose `run_background` runs the task.
    pub handler: Arc<dyn ChannelHandler>,
    /// Token the task polls.
    pub token: CancellationToken,
}

/// Shared set of active channel registrations.
pub struct HandlerRegistry {
    directory: Box<dyn ChannelDirectory>,
    loader: Box<dyn HandlerLoader>,
    registrations: Mutex<BTreeMap<String, ChannelRegistration>>,
}

impl HandlerRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new(directory: Box<dyn ChannelDirectory>, loader: Box<dyn HandlerLoader>) -> Self {
        Self {
            directory,
            loader,
            registrations: Mutex::new(BTreeMap::new()),
        }
    }

    /// Rescans the channel directory and replaces the registration set.
    ///
    /// Handlers load without holding the registry lock, so event lookups are
    /// not blocked by slow scripts.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the channel directory cannot be
    /// listed; the registration set is left untouched.
    pub fn reload(&self) -> Result<ReloadReport, DirectoryError> {
        let names = self.directory.channel_names()?;
        let loaded: Vec<LoadOutcome> = names
            .into_iter()
            .map(|name| {
                let outcome = self.loader.load(&name);
                (name, outcome)
            })
            .collect();

        let mut registrations = self.lock();
        let previous = std::mem::take(&mut *registrations);
        let (next, report) = rebuild(previous, loaded);
        *registrations = next;
        drop(registrations);

        info!(
            target: REGISTRY_TARGET,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            dropped = report.dropped.len(),
            "registry reloaded"
        );
        Ok(report)
    }

    /// Handler registered for `channel`.
    #[must_use]
    pub fn lookup(&self, channel: &str) -> Option<Arc<dyn ChannelHandler>> {
        self.lock().get(channel).map(ChannelRegistration::handler)
    }

    /// Cancels and removes the registration for `channel`. Returns `false`
    /// when none existed.
    pub fn remove(&self, channel: &str) -> bool {
        let removed = self.lock().remove(channel);
        let Some(registration) = removed else {
            return false;
        };
        registration.retire();
        info!(target: REGISTRY_TARGET, channel, "channel unregistered");
        true
    }

    /// Claims every background task that has not been started yet.
    #[must_use]
    pub fn claim_pending_background(&self) -> Vec<BackgroundLaunch> {
        self.lock()
            .values()
            .filter_map(|registration| {
                let background = registration.background();
                background.claim().then(|| BackgroundLaunch {
                    channel: registration.name().to_owned(),
                    handler: registration.handler(),
                    token: background.token().clone(),
                })
            })
            .collect()
    }

    /// Registered channel names, sorted.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn channels(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Current registration for `channel`.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn registration(&self, channel: &str) -> Option<ChannelRegistration> {
        self.lock().get(channel).cloned()
    }

    /// Cancels and removes every registration.
    pub fn clear(&self) {
        let registrations = std::mem::take(&mut *self.lock());
        for registration in registrations.into_values() {
            registration.retire();
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ChannelRegistration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
