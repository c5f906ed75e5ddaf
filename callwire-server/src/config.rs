//! Relay configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables for the signaling relay.
///
/// The JWT key is not part of this struct; the binary reads it from the
/// environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind (default `"0.0.0.0"`).
    pub host: IpAddr,
    /// Port to bind (default `8080`).
    pub port: u16,
    /// Capacity of each connection's outbound queue.
    pub outbound_capacity: usize,
    /// Seconds between liveness pings.
    pub ping_interval_secs: u64,
    /// Seconds a connection may stay silent before it is dropped.
    pub read_deadline_secs: u64,
    /// Seconds a single frame write may take.
    pub write_wait_secs: u64,
    /// Largest inbound frame accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            outbound_capacity: 100,
            ping_interval_secs: 54,
            read_deadline_secs: 60,
            write_wait_secs: 10,
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl RelayConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_capacity == 0 {
            return Err(ConfigError::Invalid(
                "outbound_capacity must be at least 1".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_bytes must be at least 1".into(),
            ));
        }
        if self.ping_interval_secs == 0 || self.write_wait_secs == 0 {
            return Err(ConfigError::Invalid(
                "ping_interval_secs and write_wait_secs must be positive".into(),
            ));
        }
        if self.ping_interval_secs >= self.read_deadline_secs {
            return Err(ConfigError::Invalid(format!(
                "ping_interval_secs ({}) must be shorter than read_deadline_secs ({})",
                self.ping_interval_secs, self.read_deadline_secs
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn timing(&self) -> ConnectionTiming {
        ConnectionTiming {
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            read_deadline: Duration::from_secs(self.read_deadline_secs),
            write_wait: Duration::from_secs(self.write_wait_secs),
        }
    }
}

/// Per-connection timers handed to the read and write loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionTiming {
    pub ping_interval: Duration,
    pub read_deadline: Duration,
    pub write_wait: Duration,
}

impl Default for ConnectionTiming {
    fn default() -> Self {
        RelayConfig::default().timing()
    }
}
