//! Chat relay daemon for Twitch channels.
//!
//! The daemon keeps one authenticated [`session::Session`] open to the chat
//! service and routes every incoming event to the Lua handler registered for
//! its channel. Handlers live in `<channels_dir>/<channel>/main.lua` and are
//! hot-reloaded on request.
//!
//! A loopback control socket accepts single-line requests of the form
//! `COMMAND===CHANNEL===MESSAGE` to join or leave channels, send messages,
//! reload handlers and stop the daemon. The `aptbot` command-line client in
//! the same workspace speaks this protocol.
//!
//! Startup follows a fixed order: configuration and telemetry first, then the
//! control socket, the chat session, the initial channel joins and finally
//! the handler registry and dispatcher. Each milestone is reported through a
//! [`HealthReporter`] so operators can tell where a launch stopped.

mod bootstrap;
pub mod control;
pub mod dispatch;
pub mod handler;
mod health;
mod process;
pub mod protocol;
pub mod registry;
pub mod session;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, ShutdownCause, StructuredHealthReporter};
pub use process::{
    LaunchError, LaunchPlan, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use telemetry::TelemetryError;

#[cfg(test)]
mod tests;
