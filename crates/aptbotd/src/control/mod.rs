//! Loopback control plane.
//!
//! [`ControlServer`] accepts one connection per cycle, reads a single
//! `COMMAND===CHANNEL===MESSAGE` request and hands it to a
//! [`ControlHandler`]. [`DaemonControl`] applies requests to the session and
//! handler registry.

mod errors;
mod handler;
mod server;

pub use errors::ControlError;
pub use handler::{ControlHandler, ControlOutcome, DaemonControl};
pub use server::{ControlServer, ServeOutcome};

const CONTROL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::control");
