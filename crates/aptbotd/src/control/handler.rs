//! Application of control requests to daemon state.

use std::sync::Arc;

use tracing::{info, warn};

use aptbot_control::{ControlCommand, ControlReply, ControlRequest};

use super::CONTROL_TARGET;
use crate::dispatch::start_background_tasks;
use crate::registry::HandlerRegistry;
use crate::session::{ChatSession, SessionControl};

/// What the server does after answering a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Reply and keep serving.
    Continue(ControlReply),
    /// Reply, close the listener and stop.
    Shutdown(ControlReply),
}

impl ControlOutcome {
    /// Reply written to the client.
    #[must_use]
    pub fn reply(&self) -> &ControlReply {
        match self {
            Self::Continue(reply) | Self::Shutdown(reply) => reply,
        }
    }
}

/// Applies one decoded control request.
pub trait ControlHandler {
    /// Handles `request` and reports whether serving continues.
    fn handle(&self, request: &ControlRequest) -> ControlOutcome;
}

/// Control handler acting on the live session and registry.
pub struct DaemonControl<S> {
    session: Arc<S>,
    registry: Arc<HandlerRegistry>,
}

impl<S> DaemonControl<S>
where
    S: SessionControl + 'static,
{
    /// Builds a handler over `session` and `registry`.
    #[must_use]
    pub fn new(session: Arc<S>, registry: Arc<HandlerRegistry>) -> Self {
        Self { session, registry }
    }

    fn join(&self, channel: &str) -> ControlReply {
        match self.session.join_channel(channel) {
            Ok(()) => ControlReply::Accepted,
            Err(error) => ControlReply::rejected(error.to_string()),
        }
    }

    fn part(&self, channel: &str) -> ControlReply {
        self.registry.remove(channel);
        match self.session.leave_channel(channel) {
            Ok(true) => ControlReply::Accepted,
            Ok(false) => ControlReply::rejected(format!("not joined to {channel}")),
            Err(error) => ControlReply::rejected(error.to_string()),
        }
    }

    fn send(&self, channel: &str, message: &str) -> ControlReply {
        match self.session.send_message(channel, &[message], None) {
            Ok(()) => ControlReply::Accepted,
            Err(error) => ControlReply::rejected(error.to_string()),
        }
    }

    fn update(&self) -> ControlReply {
        let report = match self.registry.reload() {
            Ok(report) => report,
            Err(error) => {
                warn!(target: CONTROL_TARGET, error = %error, "reload failed");
                return ControlReply::rejected(error.to_string());
            }
        };
        let chat: Arc<dyn ChatSession> = Arc::clone(&self.session) as Arc<dyn ChatSession>;
        let started = start_background_tasks(&self.registry, &chat);
        info!(
            target: CONTROL_TARGET,
            loaded = report.loaded.len(),
            started = started.len(),
            "handlers reloaded"
        );
        if report.is_clean() {
            ControlReply::Accepted
        } else {
            ControlReply::rejected(format!("failed to load: {}", report.failed.join(", ")))
        }
    }
}

impl<S> ControlHandler for DaemonControl<S>
where
    S: SessionControl + 'static,
{
    fn handle(&self, request: &ControlRequest) -> ControlOutcome {
        let channel = request.channel();
        let needs_channel = matches!(
            request.command(),
            ControlCommand::Join | ControlCommand::Part | ControlCommand::Send
        );
        if needs_channel && channel.is_empty() {
            return ControlOutcome::Continue(ControlReply::rejected("missing channel"));
        }

        let reply = match request.command() {
            ControlCommand::Join => self.join(channel),
            ControlCommand::Part => self.part(channel),
            ControlCommand::Send => self.send(channel, request.message()),
            ControlCommand::Update => self.update(),
            ControlCommand::Kill => {
                self.session.disconnect();
                self.registry.clear();
                return ControlOutcome::Shutdown(ControlReply::Accepted);
            }
        };
        ControlOutcome::Continue(reply)
    }
}
