//! Per-channel handler units.
//!
//! A handler reacts to individual events through [`ChannelHandler::on_event`]
//! and may run one long-lived task per channel through
//! [`ChannelHandler::run_background`]. Handlers are produced by a
//! [`HandlerLoader`]; the production loader evaluates Lua scripts.

mod cancel;
mod errors;
mod lua;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

pub use cancel::CancellationToken;
pub use errors::{HandlerError, LoadError};
pub use lua::{HANDLER_FILE, LuaHandlerLoader};

use crate::protocol::Event;
use crate::session::ChatSession;

/// Loaded, callable unit serving one channel.
pub trait ChannelHandler: Send + Sync {
    /// Processes one event addressed to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the handler fails; the caller logs it.
    fn on_event(&self, session: Arc<dyn ChatSession>, event: &Event) -> Result<(), HandlerError>;

    /// Runs the channel's long-lived task until it finishes or `token` is
    /// cancelled. Implementations must poll `token` and return promptly once
    /// it is set.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the task fails; the caller logs it.
    fn run_background(
        &self,
        session: Arc<dyn ChatSession>,
        event: &Event,
        token: &CancellationToken,
    ) -> Result<(), HandlerError>;
}

/// Produces handlers for channel names.
pub trait HandlerLoader: Send + Sync {
    /// Loads the handler for `channel` from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the unit is missing or fails to evaluate.
    fn load(&self, channel: &str) -> Result<Arc<dyn ChannelHandler>, LoadError>;
}
