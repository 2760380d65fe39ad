//! Accept loop for the loopback control socket.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use aptbot_control::{ControlRequest, MAX_REQUEST_BYTES};

use super::{CONTROL_TARGET, ControlError, ControlHandler, ControlOutcome};

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Why [`ControlServer::serve`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome<T> {
    /// A `KILL` request was served.
    Killed,
    /// The interrupt probe produced a value.
    Interrupted(T),
}

/// Listener for control-plane connections.
#[derive(Debug)]
pub struct ControlServer {
    listener: TcpListener,
    address: SocketAddr,
    poll_interval: Duration,
}

impl ControlServer {
    /// Binds `address` and switches the listener to non-blocking accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] when the socket cannot be bound.
    pub fn bind(address: SocketAddr, poll_interval: Duration) -> Result<Self, ControlError> {
        let listener = TcpListener::bind(address).map_err(|source| ControlError::Bind {
            addr: address,
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ControlError::NonBlocking { source })?;
        let address = listener
            .local_addr()
            .map_err(|source| ControlError::LocalAddr { source })?;
        Ok(Self {
            listener,
            address,
            poll_interval,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Serves one request per accepted connection until a `KILL` request
    /// arrives or `interrupt` returns a value. The listener closes when this
    /// returns.
    pub fn serve<H, T>(
        self,
        handler: &H,
        mut interrupt: impl FnMut() -> Option<T>,
    ) -> ServeOutcome<T>
    where
        H: ControlHandler + ?Sized,
    {
        info!(target: CONTROL_TARGET, address = %self.address, "control socket listening");
        let mut last_error = None::<io::ErrorKind>;
        loop {
            if let Some(value) = interrupt() {
                info!(target: CONTROL_TARGET, "control loop interrupted");
                return ServeOutcome::Interrupted(value);
            }
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    last_error = None;
                    debug!(target: CONTROL_TARGET, peer = %peer, "control connection accepted");
                    if let Some(ControlOutcome::Shutdown(_)) = serve_connection(stream, handler) {
                        info!(target: CONTROL_TARGET, "shutdown requested over control socket");
                        return ServeOutcome::Killed;
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.poll_interval);
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(target: CONTROL_TARGET, error = %error, "control accept error");
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
    }
}

fn serve_connection<H>(mut stream: TcpStream, handler: &H) -> Option<ControlOutcome>
where
    H: ControlHandler + ?Sized,
{
    let raw = match read_request(&mut stream) {
        Ok(raw) => raw,
        Err(error) => {
            warn!(target: CONTROL_TARGET, error = %error, "failed to read control request");
            return None;
        }
    };
    let request = match ControlRequest::parse(&raw) {
        Ok(request) => request,
        Err(error) => {
            debug!(target: CONTROL_TARGET, error = %error, "ignoring control request");
            return None;
        }
    };
    info!(
        target: CONTROL_TARGET,
        command = %request.command(),
        channel = request.channel(),
        "control request"
    );
    let outcome = handler.handle(&request);
    let reply = format!("{}\n", outcome.reply());
    if let Err(error) = stream.write_all(reply.as_bytes()).and_then(|()| stream.flush()) {
        debug!(target: CONTROL_TARGET, error = %error, "client went away before the reply");
    }
    Some(outcome)
}

fn read_request(stream: &mut TcpStream) -> io::Result<String> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut buffer = vec![0_u8; MAX_REQUEST_BYTES];
    let mut filled = 0;
    while filled < buffer.len() {
        let read = match stream.read(&mut buffer[filled..]) {
            Ok(read) => read,
            Err(error) if filled > 0 && is_timeout(&error) => break,
            Err(error) => return Err(error),
        };
        if read == 0 {
            break;
        }
        filled += read;
        if buffer[..filled].contains(&b'\n') {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer[..filled]).into_owned())
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
