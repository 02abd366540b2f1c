//! Blocking TCP connection with a line buffer.
//!
//! [`Connection`] owns one socket. Reads wait at most
//! [`ConnectionConfig::read_timeout`] and then hand control back, so a caller
//! can poll it from a plain loop without ever blocking forever. Writes are
//! retried on timeout according to a bounded [`RetryPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use slirc_client::connection::{Connection, ConnectionConfig, ServerAddress};
//! use slirc_client::Message;
//!
//! # fn main() -> slirc_client::error::Result<()> {
//! let address: ServerAddress = "irc.libera.chat:6667".parse()?;
//! let mut conn = Connection::new(address, ConnectionConfig::default())?;
//! conn.open()?;
//! conn.send(Message::nick("example_bot"))?;
//! while conn.is_open() {
//!     if let Some(decoded) = conn.read()? {
//!         println!("{:?}", decoded.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, SockRef, Socket, TcpKeepalive, Type};
use tracing::{debug, error, info, warn};

use crate::error::{Anomaly, ProtocolError, Result};
use crate::line::LineBuffer;
use crate::message::{decode, Decoded, Message};

/// Default IRC port.
pub const DEFAULT_PORT: u16 = 6667;

/// Default number of bytes requested per `recv`.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Default time a single read waits before reporting "nothing yet".
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A `host:port` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerAddress {
    /// Host name or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddress {
    /// Create an address from its parts.
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`.
    ///
    /// The port defaults to [`DEFAULT_PORT`]. A bare IPv6 literal without
    /// brackets is taken as a host with the default port.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || ProtocolError::InvalidAddress(s.to_owned());
        let s = s.trim();

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match s.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                _ => (s, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }
}

impl FromStr for ServerAddress {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How often, and how patiently, a timed-out write is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Consecutive timed-out attempts allowed before giving up.
    pub max_attempts: u32,
    /// Pause after the first timeout; doubled after each further one.
    pub initial_backoff: Duration,
    /// Upper bound on a single pause.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Pause to take after the `attempt`-th consecutive timeout (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
        }
    }
}

/// Socket and buffering settings for a [`Connection`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionConfig {
    /// How long one read waits for data. Must be non-zero.
    pub read_timeout: Duration,
    /// How long one write waits before counting as timed out. Must be non-zero.
    pub write_timeout: Duration,
    /// Per-candidate connect timeout; `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// TCP keepalive idle time; `None` leaves keepalive off.
    pub tcp_keepalive: Option<Duration>,
    /// Bytes requested per read call.
    pub read_buffer_size: usize,
    /// Retry behaviour for timed-out writes.
    pub send_retry: RetryPolicy,
    /// Wire charset label (only honoured with the `encoding` feature).
    pub encoding: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout: READ_TIMEOUT,
            write_timeout: READ_TIMEOUT,
            connect_timeout: None,
            tcp_keepalive: Some(Duration::from_secs(120)),
            read_buffer_size: READ_BUFFER_SIZE,
            send_retry: RetryPolicy::default(),
            encoding: "utf-8".to_string(),
        }
    }
}

/// Something that can be written to the wire: a raw line or a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// A preformatted line, sent as is (include the CRLF).
    Raw(String),
    /// A message, encoded before sending.
    Message(Message),
}

impl From<Message> for Outbound {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<String> for Outbound {
    fn from(line: String) -> Self {
        Self::Raw(line)
    }
}

impl From<&str> for Outbound {
    fn from(line: &str) -> Self {
        Self::Raw(line.to_owned())
    }
}

/// A single line-oriented TCP connection to an IRC server.
#[derive(Debug)]
pub struct Connection {
    address: ServerAddress,
    config: ConnectionConfig,
    socket: Option<TcpStream>,
    buffer: LineBuffer,
    chunk: Vec<u8>,
}

impl Connection {
    /// Create an unopened connection.
    pub fn new(address: ServerAddress, config: ConnectionConfig) -> Result<Self> {
        let buffer = LineBuffer::new(&config.encoding)?;
        let chunk = vec![0u8; config.read_buffer_size.max(1)];
        Ok(Self {
            address,
            config,
            socket: None,
            buffer,
            chunk,
        })
    }

    /// The address this connection dials.
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// True while a socket is held.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Number of received bytes not yet handed out as lines.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Resolve the address and connect to the first candidate that accepts.
    pub fn open(&mut self) -> Result<()> {
        let ServerAddress { host, port } = &self.address;
        let candidates: Vec<SocketAddr> = (host.as_str(), *port)
            .to_socket_addrs()
            .map_err(|source| ProtocolError::Resolve {
                host: host.clone(),
                port: *port,
                source,
            })?
            .collect();

        let mut last_error = None;
        for candidate in candidates {
            match self.connect_candidate(candidate) {
                Ok(stream) => {
                    info!(address = %self.address, peer = %candidate, "connected");
                    self.socket = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    debug!(peer = %candidate, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        error!(address = %self.address, "unable to connect");
        Err(ProtocolError::ConnectionFailed {
            host: host.clone(),
            port: *port,
            source: last_error.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }

    fn connect_candidate(&self, candidate: SocketAddr) -> io::Result<TcpStream> {
        let socket = Socket::new(
            Domain::for_address(candidate),
            Type::STREAM,
            Some(Protocol::TCP),
        )?;
        let target = SockAddr::from(candidate);
        match self.config.connect_timeout {
            Some(timeout) => socket.connect_timeout(&target, timeout)?,
            None => socket.connect(&target)?,
        }

        socket.set_nonblocking(false)?;
        socket.set_read_timeout(Some(self.config.read_timeout))?;
        socket.set_write_timeout(Some(self.config.write_timeout))?;
        let stream: TcpStream = socket.into();

        if let Some(idle) = self.config.tcp_keepalive {
            if let Err(e) = Self::enable_keepalive(&stream, idle) {
                warn!("failed to enable TCP keepalive: {}", e);
            }
        }
        Ok(stream)
    }

    fn enable_keepalive(stream: &TcpStream, idle: Duration) -> io::Result<()> {
        let sock = SockRef::from(stream);
        sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))
    }

    /// Release the socket. Calling this on a closed connection does nothing.
    pub fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!(address = %self.address, "closing connection");
            drop(socket);
        }
    }

    /// Read and decode the next line.
    ///
    /// - `Ok(None)`: nothing yet (the read timed out), or the connection is
    ///   closed and the buffer is drained.
    /// - `Ok(Some(decoded))`: one line was taken from the buffer and decoded;
    ///   `decoded.message` is `None` for an empty line.
    ///
    /// When the peer closes the stream the connection closes itself and any
    /// unterminated remainder is decoded with
    /// [`Anomaly::MissingLineTerminator`] attached. Other socket errors close
    /// the connection and are returned.
    pub fn read(&mut self) -> Result<Option<Decoded>> {
        while !self.buffer.has_line() {
            let Some(socket) = self.socket.as_mut() else {
                break;
            };
            match socket.read(&mut self.chunk) {
                Ok(0) => {
                    debug!(address = %self.address, "peer closed the stream");
                    self.close();
                    break;
                }
                Ok(n) => self.buffer.extend(&self.chunk[..n]),
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(address = %self.address, error = %e, "read failed");
                    self.close();
                    return Err(e.into());
                }
            }
        }

        let (line, terminated) = match self.buffer.take_line() {
            Some(line) => (line, true),
            None => match self.buffer.take_rest() {
                Some(rest) => (rest, false),
                None => return Ok(None),
            },
        };

        let mut decoded = decode(&line);
        if !terminated {
            decoded.anomalies.insert(0, Anomaly::MissingLineTerminator);
        }
        for anomaly in &decoded.anomalies {
            warn!(%anomaly, %line, "inbound anomaly");
        }
        if let Some(message) = &decoded.message {
            debug!("In: {}", message);
        }
        Ok(Some(decoded))
    }

    /// Send a raw line or an encoded message.
    ///
    /// Timed-out writes are retried per [`ConnectionConfig::send_retry`];
    /// when the policy is exhausted [`ProtocolError::SendTimedOut`] is
    /// returned and the connection stays open. Any other write error closes
    /// the connection.
    pub fn send<M: Into<Outbound>>(&mut self, outbound: M) -> Result<()> {
        let line = match outbound.into() {
            Outbound::Raw(line) => line,
            Outbound::Message(message) => {
                debug!("Out: {}", message);
                let encoded = message.encode();
                for anomaly in &encoded.anomalies {
                    warn!(%anomaly, "outbound anomaly");
                }
                encoded.line
            }
        };
        let bytes = self.buffer.encode_line(&line);

        let socket = self.socket.as_mut().ok_or(ProtocolError::NotConnected)?;
        match write_with_retry(socket, &bytes, &self.config.send_retry) {
            Err(ProtocolError::Io(e)) => {
                error!(address = %self.address, error = %e, "write failed");
                self.close();
                Err(ProtocolError::Io(e))
            }
            other => other,
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Write all of `bytes`, retrying timed-out writes per `policy`.
///
/// Progress resets the attempt counter, so only consecutive timeouts count.
fn write_with_retry<W: Write>(writer: &mut W, bytes: &[u8], policy: &RetryPolicy) -> Result<()> {
    let mut written = 0;
    let mut attempts = 0u32;

    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
            Ok(n) => {
                written += n;
                attempts = 0;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    return Err(ProtocolError::SendTimedOut { attempts });
                }
                let pause = policy.backoff(attempts);
                debug!(attempts, ?pause, "write timed out, retrying");
                thread::sleep(pause);
            }
            Err(e) => return Err(e.into()),
        }
    }

    writer.flush()?;
    Ok(())
}
