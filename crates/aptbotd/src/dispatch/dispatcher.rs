//! Event loop and background task starter.

use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use super::{DISPATCH_TARGET, HandlerPool};
use crate::protocol::Event;
use crate::registry::{BackgroundLaunch, HandlerRegistry};
use crate::session::{ChatSession, Session, SessionError};

/// Source of inbound event batches.
pub trait EventSource: Send + Sync {
    /// Returns the next batch of events, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when no further events can be produced.
    fn get_events(&self) -> Result<Vec<Event>, SessionError>;
}

impl EventSource for Session {
    fn get_events(&self) -> Result<Vec<Event>, SessionError> {
        Self::get_events(self)
    }
}

/// Routes events from one session to the registered channel handlers.
pub struct Dispatcher<S> {
    session: Arc<S>,
    registry: Arc<HandlerRegistry>,
    pool: HandlerPool,
}

impl<S> Dispatcher<S>
where
    S: EventSource + ChatSession + 'static,
{
    /// Builds a dispatcher over `session` and `registry`.
    #[must_use]
    pub fn new(session: Arc<S>, registry: Arc<HandlerRegistry>, pool: HandlerPool) -> Self {
        Self {
            session,
            registry,
            pool,
        }
    }

    /// Dispatches events until the session stops producing them.
    ///
    /// Returns `Ok` once the session has been disconnected deliberately.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] that ended the loop otherwise, such as
    /// an exhausted reconnect budget.
    pub fn run_forever(&self) -> Result<(), SessionError> {
        info!(
            target: DISPATCH_TARGET,
            workers = self.pool.size(),
            "dispatcher running"
        );
        loop {
            match self.session.get_events() {
                Ok(events) => {
                    for event in events {
                        self.dispatch(event);
                    }
                }
                Err(SessionError::NotConnected) => {
                    info!(target: DISPATCH_TARGET, "session closed; dispatcher stopping");
                    return Ok(());
                }
                Err(error) => {
                    error!(target: DISPATCH_TARGET, error = %error, "dispatcher stopping");
                    return Err(error);
                }
            }
        }
    }

    /// Hands `event` to its channel's handler on a worker. Returns whether a
    /// handler was found.
    pub fn dispatch(&self, event: Event) -> bool {
        if event.channel().is_empty() {
            return false;
        }
        let Some(handler) = self.registry.lookup(event.channel()) else {
            return false;
        };
        let session: Arc<dyn ChatSession> = Arc::clone(&self.session) as Arc<dyn ChatSession>;
        let queued = self.pool.submit(move || {
            if let Err(error) = handler.on_event(session, &event) {
                warn!(
                    target: DISPATCH_TARGET,
                    channel = %event.channel(),
                    error = %error,
                    "handler failed"
                );
            }
        });
        if !queued {
            warn!(target: DISPATCH_TARGET, "handler pool closed; event discarded");
        }
        queued
    }

    /// Releases the worker pool after its queued jobs finish.
    pub fn shutdown(self) {
        self.pool.shutdown();
    }
}

/// Starts every registered background task that has not been started yet,
/// each on its own `bg-<channel>` thread. Returns the channels started.
pub fn start_background_tasks(
    registry: &HandlerRegistry,
    session: &Arc<dyn ChatSession>,
) -> Vec<String> {
    registry
        .claim_pending_background()
        .into_iter()
        .filter_map(|launch| {
            let channel = launch.channel.clone();
            spawn_background(launch, Arc::clone(session)).then_some(channel)
        })
        .collect()
}

fn spawn_background(launch: BackgroundLaunch, session: Arc<dyn ChatSession>) -> bool {
    let BackgroundLaunch {
        channel,
        handler,
        token,
    } = launch;
    let thread_name = format!("bg-{channel}");
    let task_channel = channel.clone();
    let spawned = thread::Builder::new().name(thread_name).spawn(move || {
        let event = Event::for_channel(task_channel.as_str());
        match handler.run_background(session, &event, &token) {
            Ok(()) => debug!(
                target: DISPATCH_TARGET,
                channel = %task_channel,
                "background task finished"
            ),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                channel = %task_channel,
                error = %error,
                "background task failed"
            ),
        }
    });
    match spawned {
        Ok(_) => {
            debug!(target: DISPATCH_TARGET, channel = %channel, "background task started");
            true
        }
        Err(error) => {
            error!(
                target: DISPATCH_TARGET,
                channel = %channel,
                error = %error,
                "could not spawn background task"
            );
            false
        }
    }
}
