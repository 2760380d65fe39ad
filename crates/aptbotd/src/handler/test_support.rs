//! Test doubles for sessions, handlers and loaders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CancellationToken, ChannelHandler, HandlerError, HandlerLoader, LoadError};
use crate::protocol::Event;
use crate::session::{ChatSession, SessionControl, SessionError};

/// One outbound chat line captured by [`RecordingSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentLine {
    pub(crate) channel: String,
    pub(crate) text: String,
    pub(crate) reply_to: Option<String>,
}

/// Session that records every call instead of touching a network.
#[derive(Debug, Default)]
pub(crate) struct RecordingSession {
    sent: Mutex<Vec<SentLine>>,
    joined: Mutex<Vec<String>>,
    parted: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

impl RecordingSession {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn sent(&self) -> Vec<SentLine> {
        self.sent.lock().expect("sent mutex").clone()
    }

    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|line| line.text).collect()
    }

    pub(crate) fn joined(&self) -> Vec<String> {
        self.joined.lock().expect("joined mutex").clone()
    }

    pub(crate) fn parted(&self) -> Vec<String> {
        self.parted.lock().expect("parted mutex").clone()
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl ChatSession for RecordingSession {
    fn nick(&self) -> &str {
        "aptbot"
    }

    fn send_message(
        &self,
        channel: &str,
        lines: &[&str],
        reply_to: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut sent = self.sent.lock().expect("sent mutex");
        sent.extend(lines.iter().map(|text| SentLine {
            channel: channel.to_owned(),
            text: (*text).to_owned(),
            reply_to: reply_to.map(str::to_owned),
        }));
        Ok(())
    }

    fn join_channel(&self, channel: &str) -> Result<(), SessionError> {
        let mut joined = self.joined.lock().expect("joined mutex");
        if !joined.iter().any(|name| name == channel) {
            joined.push(channel.to_owned());
        }
        Ok(())
    }

    fn leave_channel(&self, channel: &str) -> Result<bool, SessionError> {
        let mut joined = self.joined.lock().expect("joined mutex");
        let Some(index) = joined.iter().position(|name| name == channel) else {
            return Ok(false);
        };
        joined.remove(index);
        self.parted
            .lock()
            .expect("parted mutex")
            .push(channel.to_owned());
        Ok(true)
    }
}

impl SessionControl for RecordingSession {
    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler recording events and, in the background, idling until cancelled.
#[derive(Debug, Default)]
pub(crate) struct StubHandler {
    events: Mutex<Vec<Event>>,
    background_runs: AtomicUsize,
    fail_events: bool,
}

impl StubHandler {
    pub(crate) fn failing() -> Self {
        Self {
            fail_events: true,
            ..Self::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events mutex").clone()
    }

    pub(crate) fn background_runs(&self) -> usize {
        self.background_runs.load(Ordering::SeqCst)
    }
}

impl ChannelHandler for StubHandler {
    fn on_event(&self, _session: Arc<dyn ChatSession>, event: &Event) -> Result<(), HandlerError> {
        self.events.lock().expect("events mutex").push(event.clone());
        if self.fail_events {
            return Err(HandlerError::Script {
                channel: event.channel().to_owned(),
                entry_point: "main",
                message: "stub failure".to_owned(),
            });
        }
        Ok(())
    }

    fn run_background(
        &self,
        _session: Arc<dyn ChatSession>,
        _event: &Event,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        self.background_runs.fetch_add(1, Ordering::SeqCst);
        while !token.wait_timeout(Duration::from_millis(5)) {}
        Ok(())
    }
}

/// Loader serving pre-built handlers and counting load calls per channel.
/// Channels without a handler fail to load.
#[derive(Debug, Default)]
pub(crate) struct StubLoader {
    handlers: Mutex<HashMap<String, Arc<StubHandler>>>,
    loads: Mutex<HashMap<String, usize>>,
}

impl StubLoader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, channel: &str, handler: Arc<StubHandler>) -> Self {
        self.provide(channel, handler);
        self
    }

    pub(crate) fn provide(&self, channel: &str, handler: Arc<StubHandler>) {
        self.handlers
            .lock()
            .expect("handlers mutex")
            .insert(channel.to_owned(), handler);
    }

    pub(crate) fn withdraw(&self, channel: &str) {
        self.handlers.lock().expect("handlers mutex").remove(channel);
    }

    pub(crate) fn load_count(&self, channel: &str) -> usize {
        self.loads
            .lock()
            .expect("loads mutex")
            .get(channel)
            .copied()
            .unwrap_or_default()
    }
}

impl HandlerLoader for StubLoader {
    fn load(&self, channel: &str) -> Result<Arc<dyn ChannelHandler>, LoadError> {
        *self
            .loads
            .lock()
            .expect("loads mutex")
            .entry(channel.to_owned())
            .or_default() += 1;
        let handler = self.handlers.lock().expect("handlers mutex").get(channel).cloned();
        match handler {
            Some(handler) => Ok(handler as Arc<dyn ChannelHandler>),
            None => Err(LoadError::Missing {
                path: format!("{channel}/main.lua").into(),
            }),
        }
    }
}

impl HandlerLoader for Arc<StubLoader> {
    fn load(&self, channel: &str) -> Result<Arc<dyn ChannelHandler>, LoadError> {
        self.as_ref().load(channel)
    }
}
