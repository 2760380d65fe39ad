//! Loopback exchange with the daemon's control socket.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use aptbot_control::{ControlReply, ControlRequest, MAX_REQUEST_BYTES};

use crate::AppError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `request` and waits for the one-line acknowledgement.
///
/// The write side is closed after sending so the daemon sees the end of the
/// request without waiting for its read timeout.
pub(crate) fn exchange(
    address: SocketAddr,
    request: &ControlRequest,
) -> Result<ControlReply, AppError> {
    let mut stream = TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
        .map_err(|source| AppError::Connect { address, source })?;
    stream
        .set_read_timeout(Some(CONNECTION_TIMEOUT))
        .map_err(AppError::ReadReply)?;
    stream
        .write_all(request.encode().as_bytes())
        .and_then(|()| stream.flush())
        .map_err(AppError::SendRequest)?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(AppError::SendRequest)?;

    let mut reply = String::new();
    stream
        .take(u64::try_from(MAX_REQUEST_BYTES).unwrap_or(u64::MAX))
        .read_to_string(&mut reply)
        .map_err(AppError::ReadReply)?;
    let line = reply.lines().next().unwrap_or_default();
    if line.is_empty() {
        return Err(AppError::MissingReply);
    }
    Ok(ControlReply::parse(line))
}
