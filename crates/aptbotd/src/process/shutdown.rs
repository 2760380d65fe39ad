//! Termination signal probes.

use std::io;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

use super::PROCESS_TARGET;

/// Non-blocking probe for an external shutdown request.
pub trait ShutdownSignal: Send {
    /// Returns the signal number once a shutdown has been requested.
    fn poll(&mut self) -> Option<i32>;
}

/// Probe listening for `SIGTERM` and `SIGINT`.
pub struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    /// Installs the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns the IO error raised while registering the handlers.
    pub fn install() -> io::Result<Self> {
        let signals = Signals::new([SIGTERM, SIGINT])?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn poll(&mut self) -> Option<i32> {
        let signal = self.signals.pending().next()?;
        info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        Some(signal)
    }
}
