//! Event dispatch to channel handlers.
//!
//! [`Dispatcher::run_forever`] pulls event batches from the session and hands
//! each channel event to a [`HandlerPool`] worker, fire-and-forget. Events
//! for channels without a registration are ignored. The dispatcher also
//! starts each channel's background task once per registration via
//! [`start_background_tasks`].

mod dispatcher;
mod pool;

pub use dispatcher::{Dispatcher, EventSource, start_background_tasks};
pub use pool::HandlerPool;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
