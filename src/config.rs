//! Configuration for dbwire
//!
//! Centralized client configuration with sensible defaults, overridable
//! from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, WireError};

/// Environment variable names read by [`ClientConfig::from_env`]
pub const ENV_HOST: &str = "ENGINE_HOST";
pub const ENV_PORT: &str = "ENGINE_PORT";
pub const ENV_POOL_SIZE: &str = "ENGINE_POOL_SIZE";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const ENV_RECONNECT_DELAY: &str = "ENGINE_RECONNECT_DELAY";

/// Client configuration for reaching the storage engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Engine Address
    // -------------------------------------------------------------------------
    /// Engine host name or IP
    pub host: String,

    /// Engine TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Number of long-lived pooled connections (fixed for the pool's lifetime)
    pub pool_size: usize,

    /// Delay before a pooled connection re-dials after its socket is spent
    /// or fails (milliseconds)
    pub reconnect_delay_ms: u64,

    // -------------------------------------------------------------------------
    // Batch Tooling
    // -------------------------------------------------------------------------
    /// Per-request deadline used by `send_with_timeout` (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            pool_size: 4,
            reconnect_delay_ms: 100,
            request_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Missing variables keep their defaults; present but unparsable ones
    /// are a configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = parse_var(&lookup, ENV_PORT)? {
            config.port = port;
        }
        if let Some(size) = parse_var(&lookup, ENV_POOL_SIZE)? {
            config.pool_size = size;
        }
        if let Some(ms) = parse_var(&lookup, ENV_REQUEST_TIMEOUT)? {
            config.request_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, ENV_RECONNECT_DELAY)? {
            config.reconnect_delay_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pool depends on
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(WireError::Config("pool size must be at least 1".to_string()));
        }
        if self.host.is_empty() {
            return Err(WireError::Config("engine host must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` string used to dial the engine
    pub fn engine_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| WireError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: ClientConfig,
}

impl ConfigBuilder {
    /// Set the engine host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the engine port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the number of pooled connections
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the reconnect delay (in milliseconds)
    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    /// Set the request timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
