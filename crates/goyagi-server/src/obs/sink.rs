//! Statsd transports behind the metrics client.
//!
//! `UdpSink` writes DogStatsD-style datagrams on a connected, non-blocking UDP
//! socket; every call is an independent send, so the sink can be shared across
//! request tasks without locking. `RecordingSink` and `FailingSink` stand in for
//! the network in tests.

use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use thiserror::Error;

/// Failure to hand a sample to the telemetry backend.
///
/// Never leaves the metrics client; see [`crate::obs::Metrics`].
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("statsd transport: {0}")]
    Transport(#[from] std::io::Error),
}

/// Backend statsd client.
pub trait StatsdSink: Send + Sync {
    fn count(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), TelemetryError>;
    fn histogram(&self, name: &str, value: f64, tags: &[&str], rate: f64)
        -> Result<(), TelemetryError>;
}

/// Render one metric line: `name:value|type[|@rate][|#tag,tag]`.
pub(crate) fn format_line(name: &str, value: &str, kind: &str, tags: &[&str], rate: f64) -> String {
    let mut out = String::with_capacity(name.len() + value.len() + 16);
    let _ = write!(out, "{name}:{value}|{kind}");
    if rate < 1.0 {
        let _ = write!(out, "|@{rate}");
    }
    if !tags.is_empty() {
        let _ = write!(out, "|#{}", tags.join(","));
    }
    out
}

pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Connect to a statsd agent at `addr` (`host:port`, IPv6 hosts bracketed).
    ///
    /// The host is resolved once, here; the local socket is bound in the
    /// address family of the first resolved address.
    pub async fn connect(addr: &str) -> std::io::Result<Self> {
        let target = tokio::net::lookup_host(addr).await?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no address for {addr}"),
            )
        })?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    fn send(&self, line: &str) -> Result<(), TelemetryError> {
        self.socket.send(line.as_bytes())?;
        Ok(())
    }
}

impl StatsdSink for UdpSink {
    fn count(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), TelemetryError> {
        self.send(&format_line(name, &value.to_string(), "c", tags, rate))
    }

    fn histogram(
        &self,
        name: &str,
        value: f64,
        tags: &[&str],
        rate: f64,
    ) -> Result<(), TelemetryError> {
        self.send(&format_line(name, &value.to_string(), "h", tags, rate))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionKind {
    Count,
    Histogram,
}

/// One sample captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub kind: EmissionKind,
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
    pub rate: f64,
}

impl Emission {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// In-memory sink that keeps every emission.
#[derive(Default)]
pub struct RecordingSink {
    emissions: Mutex<Vec<Emission>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: EmissionKind, name: &str, value: f64, tags: &[&str], rate: f64) {
        let emission = Emission {
            kind,
            name: name.to_string(),
            value,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            rate,
        };
        match self.emissions.lock() {
            Ok(mut g) => g.push(emission),
            Err(poisoned) => poisoned.into_inner().push(emission),
        }
    }

    pub fn emissions(&self) -> Vec<Emission> {
        match self.emissions.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Histogram samples recorded under the fully-qualified `name`.
    pub fn histograms(&self, name: &str) -> Vec<Emission> {
        self.emissions()
            .into_iter()
            .filter(|e| e.kind == EmissionKind::Histogram && e.name == name)
            .collect()
    }
}

impl StatsdSink for RecordingSink {
    fn count(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), TelemetryError> {
        self.push(EmissionKind::Count, name, value as f64, tags, rate);
        Ok(())
    }

    fn histogram(
        &self,
        name: &str,
        value: f64,
        tags: &[&str],
        rate: f64,
    ) -> Result<(), TelemetryError> {
        self.push(EmissionKind::Histogram, name, value, tags, rate);
        Ok(())
    }
}

/// Sink whose transport always fails. Counts attempts.
#[derive(Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    fn fail(&self) -> Result<(), TelemetryError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(TelemetryError::Transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "statsd agent unreachable",
        )))
    }
}

impl StatsdSink for FailingSink {
    fn count(&self, _: &str, _: i64, _: &[&str], _: f64) -> Result<(), TelemetryError> {
        self.fail()
    }

    fn histogram(&self, _: &str, _: f64, _: &[&str], _: f64) -> Result<(), TelemetryError> {
        self.fail()
    }
}
