//! TCP connect probing of the management port

use crate::{Result, ScanError};
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Reachability check for a single host
#[async_trait]
pub trait PortProber: Send + Sync {
    /// `true` when a TCP connection to `host:port` could be established.
    /// Never fails: every error counts as closed.
    async fn is_open(&self, host: Ipv4Addr, port: u16) -> bool;
}

/// Connect scanner, no privileges required
#[derive(Debug, Clone)]
pub struct TcpConnectProber {
    timeout: Duration,
}

impl TcpConnectProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Single connect attempt. The stream is dropped as soon as it is up.
    pub async fn probe(&self, host: Ipv4Addr, port: u16) -> Result<()> {
        let addr = SocketAddr::new(IpAddr::V4(host), port);

        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => Err(ScanError::ProbeTimeout(host)),
            Ok(Err(e)) => Err(ScanError::ProbeRefused {
                host,
                reason: e.to_string(),
            }),
            Err(_) => Err(ScanError::ProbeTimeout(host)),
        }
    }
}

#[async_trait]
impl PortProber for TcpConnectProber {
    async fn is_open(&self, host: Ipv4Addr, port: u16) -> bool {
        match self.probe(host, port).await {
            Ok(()) => true,
            Err(e) => {
                log::trace!("{}", e);
                false
            }
        }
    }
}
