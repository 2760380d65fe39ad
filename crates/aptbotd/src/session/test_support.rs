//! Scripted transports for exercising the session without a network.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{Connector, Transport, TransportError};

/// Welcome line the fake service sends after a successful handshake.
pub(crate) const WELCOME: &str = ":tmi.twitch.tv 001 aptbot :Welcome, GLHF!\r\n";

/// One scripted outcome for a `read` call.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Bytes delivered by the peer.
    Data(Vec<u8>),
    /// A transport failure.
    Fail(io::ErrorKind),
    /// The peer closed the stream.
    Eof,
}

impl Step {
    pub(crate) fn text(text: &str) -> Self {
        Self::Data(text.as_bytes().to_vec())
    }
}

/// Lines written by every transport a connector has opened.
#[derive(Debug, Clone, Default)]
pub(crate) struct Wire {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Wire {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("wire mutex").clone()
    }

    pub(crate) fn count(&self, line: &str) -> usize {
        self.lines().iter().filter(|sent| *sent == line).count()
    }

    fn record(&self, line: String) {
        self.lines.lock().expect("wire mutex").push(line);
    }
}

struct ScriptedTransport {
    steps: VecDeque<Step>,
    unfinished: Vec<u8>,
    wire: Wire,
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let count = bytes.len().min(buf.len());
                let rest = bytes.split_off(count);
                buf[..count].copy_from_slice(&bytes);
                if !rest.is_empty() {
                    self.steps.push_front(Step::Data(rest));
                }
                Ok(count)
            }
            Some(Step::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(Step::Eof) => Ok(0),
            None => {
                thread::sleep(Duration::from_millis(1));
                Err(io::Error::new(io::ErrorKind::WouldBlock, "no scripted data"))
            }
        }
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.unfinished.extend_from_slice(buf);
        while let Some(end) = self.unfinished.windows(2).position(|pair| pair == b"\r\n") {
            let line: Vec<u8> = self.unfinished.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&line[..end]).into_owned();
            self.wire.record(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.steps.clear();
        Ok(())
    }
}

/// Connector handing out one scripted transport per `open` call. A `None`
/// script, or an exhausted queue, makes `open` fail.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    scripts: Mutex<VecDeque<Option<Vec<Step>>>>,
    wire: Wire,
    opened: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a transport that will replay `steps`.
    pub(crate) fn accept(self, steps: Vec<Step>) -> Self {
        self.scripts.lock().expect("scripts mutex").push_back(Some(steps));
        self
    }

    /// Queues a failed connection attempt.
    pub(crate) fn refuse(self) -> Self {
        self.scripts.lock().expect("scripts mutex").push_back(None);
        self
    }

    pub(crate) fn wire(&self) -> Wire {
        self.wire.clone()
    }

    pub(crate) fn open_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opened)
    }
}

impl Connector for ScriptedConnector {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().expect("scripts mutex").pop_front();
        match script {
            Some(Some(steps)) => Ok(Box::new(ScriptedTransport {
                steps: steps.into(),
                unfinished: Vec::new(),
                wire: self.wire.clone(),
            })),
            Some(None) | None => Err(TransportError::Connect {
                server: "scripted".to_owned(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "scripted refusal"),
            }),
        }
    }
}
