//! Sources of "now" for validation.
//!
//! [`NetworkTime`] asks an SNTP server so that winding back the local clock
//! does not resurrect an expired licence. It is strictly best-effort: one
//! request, short timeouts, no retries, and callers fall back to
//! [`SystemClock`] on any [`TimeError`].

use crate::error::TimeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::{debug, warn};

/// Size of an SNTP request and of the fixed part of a reply.
pub const NTP_PACKET_LEN: usize = 48;

/// LI = 0, version 3, mode 3 (client).
const CLIENT_REQUEST_HEADER: u8 = 0x1B;

/// Offset of the transmit timestamp in a reply.
const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;

/// Seconds between 1900-01-01 (NTP epoch) and 1970-01-01.
const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;

/// A source of the current UTC time.
pub trait TimeSource {
    /// Returns the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeError`] if the source is unavailable.
    fn now(&self) -> Result<DateTime<Utc>, TimeError>;
}

/// The local system clock. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(Utc::now())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeSource for FixedClock {
    fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        Ok(self.0)
    }
}

/// SNTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTimeConfig {
    /// Time server host name or address.
    pub server: String,
    /// UDP port.
    pub port: u16,
    /// Send and receive timeout in milliseconds.
    ///
    /// Bounds the UDP exchange only. Host name resolution goes through the
    /// system resolver first and is limited by its own timeouts; configure
    /// an IP address as `server` to avoid the lookup entirely.
    pub timeout_ms: u64,
}

impl NetworkTimeConfig {
    /// Returns the socket timeout, at least one millisecond.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl Default for NetworkTimeConfig {
    fn default() -> Self {
        Self {
            server: "pool.ntp.org".to_string(),
            port: 123,
            timeout_ms: 3_000,
        }
    }
}

/// Queries an SNTP server for the current time.
///
/// Stateless: every call performs a fresh query.
#[derive(Debug, Clone, Default)]
pub struct NetworkTime {
    config: NetworkTimeConfig,
}

impl NetworkTime {
    /// Creates a client for the given server.
    #[must_use]
    pub fn new(config: NetworkTimeConfig) -> Self {
        Self { config }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &NetworkTimeConfig {
        &self.config
    }

    fn resolve(&self) -> Result<SocketAddr, TimeError> {
        let host = &self.config.server;
        (host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|source| TimeError::Resolve {
                host: host.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TimeError::NoAddress(host.clone()))
    }
}

impl TimeSource for NetworkTime {
    fn now(&self) -> Result<DateTime<Utc>, TimeError> {
        let server = self.resolve()?;
        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        let timeout = self.config.timeout();
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;
        socket.connect(server)?;

        socket.send(&build_request()).map_err(classify)?;
        let mut reply = [0u8; 2 * NTP_PACKET_LEN];
        let len = socket.recv(&mut reply).map_err(classify)?;

        let now = parse_reply(&reply[..len])?;
        debug!("network time from {}: {}", server, now);
        Ok(now)
    }
}

/// Builds an SNTP client request.
#[must_use]
pub fn build_request() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = CLIENT_REQUEST_HEADER;
    packet
}

/// Extracts the transmit timestamp from an SNTP reply.
///
/// Timestamps with the top bit clear are read as NTP era 1 (from 2036 on).
///
/// # Errors
///
/// Returns [`TimeError::MalformedReply`] if the reply is shorter than
/// [`NTP_PACKET_LEN`], is not a server reply, or carries no timestamp.
pub fn parse_reply(reply: &[u8]) -> Result<DateTime<Utc>, TimeError> {
    if reply.len() < NTP_PACKET_LEN {
        return Err(TimeError::MalformedReply(format!(
            "{} bytes, expected at least {NTP_PACKET_LEN}",
            reply.len()
        )));
    }
    let mode = reply[0] & 0x07;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(TimeError::MalformedReply(format!("unexpected mode {mode}")));
    }

    let at = TRANSMIT_TIMESTAMP_OFFSET;
    let secs = u32::from_be_bytes([reply[at], reply[at + 1], reply[at + 2], reply[at + 3]]);
    let fraction = u32::from_be_bytes([reply[at + 4], reply[at + 5], reply[at + 6], reply[at + 7]]);
    if secs == 0 {
        return Err(TimeError::MalformedReply("zero transmit timestamp".to_string()));
    }

    let secs = if secs & 0x8000_0000 == 0 {
        i64::from(secs) + (1i64 << 32)
    } else {
        i64::from(secs)
    };
    let nanos = ((u64::from(fraction) * 1_000_000_000) >> 32) as u32;
    DateTime::from_timestamp(secs - NTP_UNIX_OFFSET_SECS, nanos)
        .ok_or_else(|| TimeError::MalformedReply("timestamp out of range".to_string()))
}

/// Asks `source` for the time, falling back to the local clock if it is
/// unavailable.
#[must_use]
pub fn now_or_local(source: &dyn TimeSource) -> DateTime<Utc> {
    match source.now() {
        Ok(now) => now,
        Err(e) => {
            warn!("time source unavailable, using local clock: {}", e);
            Utc::now()
        }
    }
}

fn classify(e: io::Error) -> TimeError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TimeError::Timeout,
        _ => TimeError::Io(e),
    }
}
