//! Byte streams to the chat service.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::debug;

use aptbot_config::{ChatServer, StreamSecurity};

use super::{SESSION_TARGET, TransportError};

/// Bidirectional stream carrying protocol lines.
pub trait Transport: Read + Write + Send {
    /// Bounds how long a single `read` may block.
    ///
    /// # Errors
    ///
    /// Propagates the socket error.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Closes both directions of the stream.
    ///
    /// # Errors
    ///
    /// Propagates the socket error.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_read_timeout(self, timeout)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        Self::shutdown(self, Shutdown::Both)
    }
}

impl Transport for StreamOwned<ClientConnection, TcpStream> {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.sock.set_read_timeout(timeout)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.conn.send_close_notify();
        let flushed = self.flush();
        let closed = self.sock.shutdown(Shutdown::Both);
        flushed.and(closed)
    }
}

/// Opens fresh transports for the session.
pub trait Connector: Send + Sync {
    /// Opens a new transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint cannot be reached.
    fn open(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// Connector dialling the configured chat server over TCP, optionally
/// wrapped in TLS.
#[derive(Debug, Clone)]
pub struct NetworkConnector {
    server: ChatServer,
    tls: Option<Arc<ClientConfig>>,
}

impl NetworkConnector {
    /// Builds a connector for `server`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Tls`] when the TLS client cannot be
    /// configured.
    pub fn new(server: ChatServer) -> Result<Self, TransportError> {
        let tls = match server.security() {
            StreamSecurity::Plain => None,
            StreamSecurity::Tls => Some(tls_config(server.host())?),
        };
        Ok(Self { server, tls })
    }

    fn dial(&self) -> Result<TcpStream, TransportError> {
        let stream = TcpStream::connect((self.server.host(), self.server.port())).map_err(
            |source| TransportError::Connect {
                server: self.server.to_string(),
                source,
            },
        )?;
        if let Err(error) = stream.set_nodelay(true) {
            debug!(
                target: SESSION_TARGET,
                error = %error,
                "could not disable Nagle's algorithm"
            );
        }
        Ok(stream)
    }
}

impl Connector for NetworkConnector {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        let stream = self.dial()?;
        let Some(config) = &self.tls else {
            return Ok(Box::new(stream));
        };
        let host = self.server.host().to_owned();
        let name = ServerName::try_from(host.clone())
            .map_err(|_| TransportError::ServerName { host: host.clone() })?;
        let connection = ClientConnection::new(Arc::clone(config), name)
            .map_err(|source| TransportError::Tls { host, source })?;
        Ok(Box::new(StreamOwned::new(connection, stream)))
    }
}

fn tls_config(host: &str) -> Result<Arc<ClientConfig>, TransportError> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|source| TransportError::Tls {
            host: host.to_owned(),
            source,
        })?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}
