//! Configuration for PollKV
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{PollKvError, Result};
use crate::protocol::HEADER_SIZE;

/// Main configuration for a PollKV server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Disable Nagle's algorithm on accepted sockets
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Largest frame body accepted, i.e. everything after the 4-byte length.
    /// Each connection's read buffer holds exactly one such frame plus header.
    pub max_frame_size: usize,

    // -------------------------------------------------------------------------
    // Event Loop Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on a single readiness wait (milliseconds)
    pub poll_timeout_ms: u64,

    /// Readiness events drained per wait
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            nodelay: true,
            max_frame_size: 4096,
            poll_timeout_ms: 1000,
            event_capacity: 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can actually drive a server
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size < HEADER_SIZE {
            return Err(PollKvError::Config(format!(
                "max_frame_size must be at least {} bytes, got {}",
                HEADER_SIZE, self.max_frame_size
            )));
        }
        if self.max_frame_size > u32::MAX as usize {
            return Err(PollKvError::Config(format!(
                "max_frame_size {} does not fit the 32-bit length prefix",
                self.max_frame_size
            )));
        }
        if self.poll_timeout_ms == 0 {
            return Err(PollKvError::Config(
                "poll_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(PollKvError::Config(
                "event_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Readiness wait bound as a `Duration`
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Enable or disable TCP_NODELAY on accepted sockets
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the maximum frame body size (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the readiness wait timeout (in milliseconds)
    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.config.poll_timeout_ms = ms;
        self
    }

    /// Set how many readiness events are drained per wait
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
