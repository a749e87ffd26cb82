//! Control endpoint address

use std::fmt;
use std::net::SocketAddr;

use crate::error::{ProbeError, Result};

/// Default renderer host (loopback)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default renderer control port
pub const DEFAULT_PORT: u16 = 4711;

/// Host/port pair of a renderer's control listener.
///
/// Fixed for the lifetime of a run. The host may be a literal address or a
/// name; resolution happens at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(ProbeError::invalid("endpoint host is empty"));
        }
        if port == 0 {
            return Err(ProbeError::invalid("endpoint port must be in 1..=65535"));
        }
        Ok(Self {
            host: trimmed.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bare IPv6 literals need brackets to stay unambiguous
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
