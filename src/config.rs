//! Gateway connection and engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default TCP port the gateway listens on.
pub const DEFAULT_PORT: u16 = 51200;

/// Default per-command timeout in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Default pending-queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for a gateway connection and its command engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host name or IP address.
    pub host: String,
    /// Gateway TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Password for the login exchange.
    #[serde(default)]
    pub password: String,
    /// Per-command timeout in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Capacity of the pending command queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_command_timeout_ms() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl GatewayConfig {
    /// Configuration for a host with all defaults.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            password: String::new(),
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Per-command timeout as a [`Duration`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
