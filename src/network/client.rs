//! Engine Client
//!
//! Public entry point for talking to the engine.

use crate::config::ClientConfig;
use crate::error::{Result, WireError};
use crate::protocol::{encode_command, Command, Response};
use super::{fallback, ConnectionPool};

/// Dispatches commands over the connection pool, falling back to a one-shot
/// socket when the pool is saturated
///
/// Callers cannot tell which path served a request. Pool exhaustion is
/// never reported as an error.
#[derive(Debug)]
pub struct EngineClient {
    config: ClientConfig,
    addr: String,
    pool: ConnectionPool,
}

impl EngineClient {
    /// Create a client and start its pool
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let pool = ConnectionPool::new(&config)?;
        Ok(Self {
            addr: config.engine_addr(),
            config,
            pool,
        })
    }

    /// Create a client configured from `ENGINE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Send one command and wait for its normalized reply
    pub async fn send_command(&self, command: &Command) -> Result<Response> {
        let payload = encode_command(command)?;

        match self.pool.acquire() {
            Some(lease) => {
                tracing::trace!(slot = lease.slot(), action = %command.action, "dispatching on pooled connection");
                lease.send_payload(payload).await
            }
            None => {
                tracing::debug!(action = %command.action, "connection pool exhausted, using fallback socket");
                fallback::send_once(&self.addr, &payload).await
            }
        }
    }

    /// [`send_command`](Self::send_command) raced against the configured
    /// request timeout
    ///
    /// On timeout the request is abandoned, not cancelled: a pooled slot
    /// stays busy until the engine answers or the socket fails.
    pub async fn send_with_timeout(&self, command: &Command) -> Result<Response> {
        let ms = self.config.request_timeout_ms;
        tokio::time::timeout(self.config.request_timeout(), self.send_command(command))
            .await
            .map_err(|_| WireError::Timeout { ms })?
    }
}
