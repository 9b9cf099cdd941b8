//! Connection Pool
//!
//! Fixed-size set of self-healing connections. The slot count is set at
//! construction and never changes; only the sockets behind the slots are
//! replaced over time.

use std::sync::Arc;

use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::error::{Result, WireError};
use crate::protocol::{encode_command, Command, Response};
use super::{Connection, ConnectionState};

/// Fixed-size pool of engine connections
#[derive(Debug)]
pub struct ConnectionPool {
    connections: Vec<Arc<Connection>>,
}

impl ConnectionPool {
    /// Create the pool and start dialing every slot
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(WireError::Config(
                "connection pool must be created inside a tokio runtime".to_string(),
            ));
        }

        let addr = config.engine_addr();
        let connections = (0..config.pool_size)
            .map(|id| Connection::spawn(id, addr.clone(), config.reconnect_delay()))
            .collect();

        tracing::debug!(size = config.pool_size, addr = %addr, "connection pool started");
        Ok(Self { connections })
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn connections(&self) -> &[Arc<Connection>] {
        &self.connections
    }

    /// Claim the first connection that is not busy
    ///
    /// No queueing and no fairness: first idle slot wins, `None` when every
    /// slot has a request in flight.
    pub fn acquire(&self) -> Option<PoolLease> {
        self.connections.iter().find_map(|connection| {
            connection.try_claim().map(|stream| PoolLease {
                connection: Arc::clone(connection),
                stream,
                armed: true,
            })
        })
    }

    /// Number of slots without a request in flight
    pub fn available(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| c.state() != ConnectionState::Busy)
            .count()
    }
}

/// Exclusive claim on one pooled connection
///
/// Dropping an unused lease returns the slot to the pool.
pub struct PoolLease {
    connection: Arc<Connection>,
    stream: Option<TcpStream>,
    armed: bool,
}

impl PoolLease {
    /// Slot index of the claimed connection
    pub fn slot(&self) -> usize {
        self.connection.id()
    }

    pub async fn send(self, command: &Command) -> Result<Response> {
        let payload = encode_command(command)?;
        self.send_payload(payload).await
    }

    pub(crate) async fn send_payload(mut self, payload: Vec<u8>) -> Result<Response> {
        self.armed = false;
        let stream = self.stream.take();
        let connection = Arc::clone(&self.connection);
        drop(self);
        connection.dispatch(stream, payload).await
    }
}

impl Drop for PoolLease {
    fn drop(&mut self) {
        if self.armed {
            self.connection.unclaim(self.stream.take());
        }
    }
}
