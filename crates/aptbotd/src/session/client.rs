//! Session state machine: handshake, keep-alive, buffered receive and
//! reconnect.

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use aptbot_config::{Config, Credentials};

use crate::handler::CancellationToken;
use crate::protocol::{self, Command, Event, PING_PROBE, PONG_REPLY};

use super::{ChatSession, Connector, SESSION_TARGET, SessionControl, SessionError, Transport};

const RECEIVE_CHUNK: usize = 2048;
const POLL_TIMEOUT: Duration = Duration::from_millis(250);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const CAPABILITY_REQUEST: &str =
    "CAP REQ :twitch.tv/membership twitch.tv/tags twitch.tv/commands";
const REDACTED_PASS: &str = "PASS oauth:***";

/// Bounded retry schedule applied after the stream fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    /// Builds a policy making `attempts` tries, the first after `base_delay`
    /// and each later one after twice the previous delay.
    #[must_use]
    pub const fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Reads the policy from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reconnect_attempts(), config.reconnect_base_delay())
    }

    /// Delay before the zero-based `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Number of attempts before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Connection to the chat service shared by the dispatcher, the control
/// plane and handler invocations.
///
/// Reads poll with a short timeout and yield to queued writers, so outbound
/// messages are not held back by an idle receive.
pub struct Session {
    connector: Box<dyn Connector>,
    credentials: Credentials,
    policy: ReconnectPolicy,
    transport: Mutex<Option<Box<dyn Transport>>>,
    partial: Mutex<Vec<u8>>,
    joined: Mutex<BTreeSet<String>>,
    pending: Mutex<VecDeque<Event>>,
    waiting_writers: AtomicUsize,
    reconnect_requested: AtomicBool,
    closed: CancellationToken,
}

impl Session {
    /// Builds a disconnected session.
    #[must_use]
    pub fn new(
        connector: Box<dyn Connector>,
        credentials: Credentials,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            connector,
            credentials,
            policy,
            transport: Mutex::new(None),
            partial: Mutex::new(Vec::new()),
            joined: Mutex::new(BTreeSet::new()),
            pending: Mutex::new(VecDeque::new()),
            waiting_writers: AtomicUsize::new(0),
            reconnect_requested: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    /// Opens the transport and authenticates.
    ///
    /// Sends the credential, nickname and capability lines, then performs one
    /// read cycle. Events from that cycle are buffered for the next
    /// [`Session::get_events`] call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthenticationRejected`] when the first event is
    /// the service's authentication failure notice, or the transport error
    /// that prevented the handshake.
    pub fn connect(&self) -> Result<(), SessionError> {
        if self.closed.is_cancelled() {
            return Err(SessionError::NotConnected);
        }
        let mut stream = self.connector.open()?;
        for line in self.handshake_lines() {
            write_line(stream.as_mut(), &line).map_err(|source| SessionError::Io {
                action: "send the handshake",
                source,
            })?;
        }

        let mut partial = Vec::new();
        let events = stream
            .set_read_timeout(Some(HANDSHAKE_TIMEOUT))
            .and_then(|()| read_cycle(stream.as_mut(), &mut partial))
            .map_err(|source| SessionError::Io {
                action: "read the handshake response",
                source,
            })?;
        if events.first().is_some_and(Event::is_authentication_failure) {
            close_stream(stream.as_mut());
            return Err(SessionError::AuthenticationRejected);
        }
        stream
            .set_read_timeout(Some(POLL_TIMEOUT))
            .map_err(|source| SessionError::Io {
                action: "configure the read timeout",
                source,
            })?;

        *lock(&self.transport) = Some(stream);
        *lock(&self.partial) = partial;
        lock(&self.pending).extend(events);
        info!(
            target: SESSION_TARGET,
            nick = self.credentials.nick(),
            "chat session authenticated"
        );
        Ok(())
    }

    /// Returns the next batch of events.
    ///
    /// Buffered events are returned first. Otherwise one receive is performed;
    /// an idle poll yields an empty batch. A failed stream, or a `RECONNECT`
    /// request delivered in the previous batch, triggers the reconnect cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] after [`Session::disconnect`]
    /// and [`SessionError::RetriesExhausted`] when reconnecting fails.
    pub fn get_events(&self) -> Result<Vec<Event>, SessionError> {
        if self.reconnect_requested.swap(false, Ordering::SeqCst) {
            return self.reconnect();
        }
        let buffered = self.drain_pending();
        if !buffered.is_empty() {
            return Ok(buffered);
        }

        self.yield_to_writers();
        let outcome = {
            let mut transport = lock(&self.transport);
            let Some(stream) = transport.as_mut() else {
                return Err(SessionError::NotConnected);
            };
            read_cycle(stream.as_mut(), &mut lock(&self.partial))
        };

        match outcome {
            Ok(events) => {
                if events
                    .iter()
                    .any(|event| event.command() == Some(Command::Reconnect))
                {
                    info!(
                        target: SESSION_TARGET,
                        "chat service requested a reconnect"
                    );
                    self.reconnect_requested.store(true, Ordering::SeqCst);
                }
                Ok(events)
            }
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    error = %error,
                    "chat stream failed"
                );
                self.reconnect()
            }
        }
    }

    /// Closes the transport and wakes a pending reconnect backoff. Later calls
    /// have no effect.
    pub fn disconnect(&self) {
        if self.closed.cancel() {
            info!(target: SESSION_TARGET, "disconnecting from chat service");
        }
        self.close_transport();
    }

    /// Channels currently joined.
    #[must_use]
    pub fn joined_channels(&self) -> Vec<String> {
        lock(&self.joined).iter().cloned().collect()
    }

    fn handshake_lines(&self) -> [String; 3] {
        [
            format!("PASS oauth:{}", self.credentials.token().expose()),
            format!("NICK {}", self.credentials.nick()),
            CAPABILITY_REQUEST.to_owned(),
        ]
    }

    fn reconnect(&self) -> Result<Vec<Event>, SessionError> {
        self.close_transport();
        if self.closed.is_cancelled() {
            return Err(SessionError::NotConnected);
        }
        for attempt in 0..self.policy.attempts() {
            let delay = self.policy.delay_for(attempt);
            warn!(
                target: SESSION_TARGET,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting to chat service"
            );
            if self.closed.wait_timeout(delay) {
                return Err(SessionError::NotConnected);
            }
            match self.connect().and_then(|()| self.rejoin()) {
                Ok(()) => {
                    info!(
                        target: SESSION_TARGET,
                        attempt = attempt + 1,
                        "reconnected to chat service"
                    );
                    return Ok(self.drain_pending());
                }
                Err(error) => {
                    warn!(
                        target: SESSION_TARGET,
                        attempt = attempt + 1,
                        error = %error,
                        "reconnect attempt failed"
                    );
                    self.close_transport();
                }
            }
        }
        error!(
            target: SESSION_TARGET,
            attempts = self.policy.attempts(),
            "reconnect attempts exhausted"
        );
        Err(SessionError::RetriesExhausted {
            attempts: self.policy.attempts(),
        })
    }

    fn rejoin(&self) -> Result<(), SessionError> {
        for channel in self.joined_channels() {
            self.send_line(&format!("JOIN #{channel}"))?;
        }
        Ok(())
    }

    fn send_line(&self, line: &str) -> Result<(), SessionError> {
        self.waiting_writers.fetch_add(1, Ordering::SeqCst);
        let mut transport = lock(&self.transport);
        self.waiting_writers.fetch_sub(1, Ordering::SeqCst);
        let stream = transport.as_mut().ok_or(SessionError::NotConnected)?;
        write_line(stream.as_mut(), line).map_err(|source| SessionError::Io {
            action: "send a line",
            source,
        })
    }

    fn yield_to_writers(&self) {
        while self.waiting_writers.load(Ordering::SeqCst) > 0 {
            thread::yield_now();
        }
    }

    fn drain_pending(&self) -> Vec<Event> {
        lock(&self.pending).drain(..).collect()
    }

    fn close_transport(&self) {
        let stream = lock(&self.transport).take();
        lock(&self.partial).clear();
        if let Some(mut stream) = stream {
            close_stream(stream.as_mut());
        }
    }
}

impl ChatSession for Session {
    fn nick(&self) -> &str {
        self.credentials.nick()
    }

    fn send_message(
        &self,
        channel: &str,
        lines: &[&str],
        reply_to: Option<&str>,
    ) -> Result<(), SessionError> {
        let prefix = reply_to
            .map(|id| format!("@reply-parent-msg-id={id} "))
            .unwrap_or_default();
        for text in lines {
            let text = text.replace(['\r', '\n'], " ");
            self.send_line(&format!("{prefix}PRIVMSG #{channel} :{text}"))?;
        }
        Ok(())
    }

    fn join_channel(&self, channel: &str) -> Result<(), SessionError> {
        self.send_line(&format!("JOIN #{channel}"))?;
        lock(&self.joined).insert(channel.to_owned());
        Ok(())
    }

    fn leave_channel(&self, channel: &str) -> Result<bool, SessionError> {
        self.send_line(&format!("PART #{channel}"))?;
        let was_joined = lock(&self.joined).remove(channel);
        if !was_joined {
            warn!(
                target: SESSION_TARGET,
                channel,
                "left a channel that was not joined"
            );
        }
        Ok(was_joined)
    }
}

impl SessionControl for Session {
    fn disconnect(&self) {
        Self::disconnect(self);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_cycle(stream: &mut dyn Transport, partial: &mut Vec<u8>) -> io::Result<Vec<Event>> {
    let mut chunk = [0_u8; RECEIVE_CHUNK];
    let read = match stream.read(&mut chunk) {
        Ok(0) => {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by the chat service",
            ));
        }
        Ok(read) => read,
        Err(error) if is_idle(&error) => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };
    partial.extend_from_slice(chunk.get(..read).unwrap_or_default());

    let mut events = Vec::new();
    while let Some(end) = partial.iter().position(|byte| *byte == b'\n') {
        let raw: Vec<u8> = partial.drain(..=end).collect();
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.trim_end_matches(['\r', '\n']);
        debug!(target: SESSION_TARGET, line, "received");
        if line == PING_PROBE {
            write_line(stream, PONG_REPLY)?;
            continue;
        }
        if let Some(event) = protocol::parse(line) {
            events.push(event);
        }
    }
    Ok(events)
}

fn write_line(stream: &mut dyn Transport, line: &str) -> io::Result<()> {
    let logged = if line.starts_with("PASS ") {
        REDACTED_PASS
    } else {
        line
    };
    debug!(target: SESSION_TARGET, line = logged, "sending");
    stream.write_all(format!("{line}\r\n").as_bytes())?;
    stream.flush()
}

fn close_stream(stream: &mut dyn Transport) {
    if let Err(error) = stream.shutdown() {
        debug!(
            target: SESSION_TARGET,
            error = %error,
            "error while closing chat stream"
        );
    }
}

fn is_idle(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
