//! Bounded set of threads running per-message handler invocations.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::DISPATCH_TARGET;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed number of named worker threads fed by an unbounded queue.
///
/// Submission never blocks. A job that panics is logged and the worker keeps
/// serving.
#[derive(Debug)]
pub struct HandlerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl HandlerPool {
    /// Spawns `size` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns the IO error raised when a worker thread cannot be spawned.
    pub fn new(size: usize) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size.max(1))
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("handler-{index}"))
                    .spawn(move || work(&receiver))
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues `job`. Returns `false` when the pool is shutting down.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.send(Box::new(job)).is_ok())
    }

    /// Stops accepting jobs and waits for queued ones to finish.
    pub fn shutdown(mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!(target: DISPATCH_TARGET, "handler worker exited abnormally");
            }
        }
    }
}

fn work(receiver: &Mutex<Receiver<Job>>) {
    loop {
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        let Ok(job) = next else {
            break;
        };
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(target: DISPATCH_TARGET, "handler invocation panicked");
        }
    }
    debug!(target: DISPATCH_TARGET, "handler worker stopped");
}
