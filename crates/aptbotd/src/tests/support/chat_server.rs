//! Loopback stand-in for the chat service.
//!
//! Accepts plain connections one after another, records every line the
//! daemon writes and answers the client once the capability request arrives.
//! Scenarios push lines to the connected client with [`FakeChatServer::push`]
//! and drop the service for good with [`FakeChatServer::hang_up`].

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::test_support::WELCOME;

const READ_TIMEOUT: Duration = Duration::from_millis(10);
const LOGIN_REJECTED: &str = ":tmi.twitch.tv NOTICE * :Login authentication failed\r\n";

struct Shared {
    greeting: &'static str,
    received: Mutex<Vec<String>>,
    outbound: Mutex<VecDeque<String>>,
    stop: AtomicBool,
}

pub struct FakeChatServer {
    port: u16,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl FakeChatServer {
    /// Service that accepts the bot's credentials.
    pub fn start() -> Self {
        Self::with_greeting(WELCOME)
    }

    /// Service that answers every login with an authentication failure.
    pub fn rejecting() -> Self {
        Self::with_greeting(LOGIN_REJECTED)
    }

    fn with_greeting(greeting: &'static str) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind fake chat service");
        listener
            .set_nonblocking(true)
            .expect("non-blocking listener");
        let port = listener.local_addr().expect("listener address").port();
        let shared = Arc::new(Shared {
            greeting,
            received: Mutex::default(),
            outbound: Mutex::default(),
            stop: AtomicBool::new(false),
        });
        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || accept_loop(&listener, &worker));
        Self {
            port,
            shared,
            handle: Some(handle),
        }
    }

    /// Plain-text URL the daemon should dial.
    pub fn url(&self) -> String {
        format!("irc://127.0.0.1:{}", self.port)
    }

    /// Queues a raw line for delivery to the connected client.
    pub fn push(&self, line: &str) {
        self.shared
            .outbound
            .lock()
            .expect("outbound mutex")
            .push_back(format!("{line}\r\n"));
    }

    /// Closes the current connection and the listener, so every later dial
    /// is refused.
    pub fn hang_up(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<String> {
        self.shared.received.lock().expect("received mutex").clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.received().iter().filter(|seen| *seen == line).count()
    }
}

impl Drop for FakeChatServer {
    fn drop(&mut self) {
        self.hang_up();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn accept_loop(listener: &TcpListener, shared: &Shared) {
    while !shared.stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => serve_connection(stream, shared),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(READ_TIMEOUT);
            }
            Err(_) => return,
        }
    }
}

fn serve_connection(mut stream: TcpStream, shared: &Shared) {
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(READ_TIMEOUT)).is_err()
    {
        return;
    }
    let mut partial = Vec::new();
    let mut chunk = [0_u8; 512];
    while !shared.stop.load(Ordering::SeqCst) {
        let pending: Vec<String> = shared
            .outbound
            .lock()
            .expect("outbound mutex")
            .drain(..)
            .collect();
        for line in pending {
            if stream.write_all(line.as_bytes()).is_err() {
                return;
            }
        }
        match stream.read(&mut chunk) {
            Ok(0) => return,
            Ok(read) => partial.extend_from_slice(&chunk[..read]),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(_) => return,
        }
        while let Some(end) = partial.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = partial.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_owned();
            let greet = line.starts_with("CAP REQ");
            shared.received.lock().expect("received mutex").push(line);
            if greet && stream.write_all(shared.greeting.as_bytes()).is_err() {
                return;
            }
        }
    }
}
