//! Pooled Connection
//!
//! One engine socket guarded by a single-flight state machine.
//!
//! ```text
//!   Connecting ──dial ok──► Idle ──claim──► Busy
//!       ▲                                    │
//!       └──── re-dial after fixed delay ◄────┘  (reply, error or close)
//! ```
//!
//! The engine half-closes after every reply, so a socket serves exactly one
//! request; afterwards the slot is free again and a fresh socket is dialed
//! in the background. Claiming a slot whose socket is not ready yet dials
//! inline instead of waiting.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::error::{Result, WireError};
use crate::protocol::{encode_command, round_trip, Command, Response};

/// Observable state of a pooled connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Free, but no socket is ready yet (dial pending or retrying)
    Connecting,

    /// Free with a connected socket
    Idle,

    /// A request is in flight
    Busy,
}

/// Mutable part of a connection. Never locked across an await point.
struct Slot {
    busy: bool,

    /// Ready socket, if the background dial has completed
    stream: Option<TcpStream>,

    /// Bumped on every claim and every scheduled dial; a dial task whose
    /// epoch is stale discards its socket and stops
    epoch: u64,

    /// Consecutive failed dials, used to keep retry logging quiet
    failures: u32,
}

/// A long-lived, self-healing engine connection
pub struct Connection {
    /// Slot index within the pool (for logging)
    id: usize,

    /// Engine address (`host:port`)
    addr: String,

    /// Fixed delay between a spent/failed socket and the next dial
    reconnect_delay: Duration,

    slot: Mutex<Slot>,
}

impl Connection {
    /// Create a connection and start dialing immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(id: usize, addr: impl Into<String>, reconnect_delay: Duration) -> Arc<Self> {
        let connection = Arc::new(Self {
            id,
            addr: addr.into(),
            reconnect_delay,
            slot: Mutex::new(Slot {
                busy: false,
                stream: None,
                epoch: 0,
                failures: 0,
            }),
        });
        connection.schedule_dial(Duration::ZERO);
        connection
    }

    /// Slot index within the pool
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state(&self) -> ConnectionState {
        let slot = self.slot.lock();
        if slot.busy {
            ConnectionState::Busy
        } else if slot.stream.is_some() {
            ConnectionState::Idle
        } else {
            ConnectionState::Connecting
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.lock().busy
    }

    /// Send a command and wait for the normalized reply
    ///
    /// Fails with [`WireError::SocketBusy`] without touching the socket if
    /// another request is already in flight on this connection.
    pub async fn send(self: &Arc<Self>, command: &Command) -> Result<Response> {
        let payload = encode_command(command)?;
        let stream = self.try_claim().ok_or(WireError::SocketBusy)?;
        self.dispatch(stream, payload).await
    }

    // =========================================================================
    // Claiming
    // =========================================================================

    /// Atomically mark the connection busy, handing out its ready socket
    ///
    /// Returns `None` when busy. The inner `Option` is `None` when no socket
    /// has been dialed yet; the exchange then dials inline.
    pub(crate) fn try_claim(&self) -> Option<Option<TcpStream>> {
        let mut slot = self.slot.lock();
        if slot.busy {
            return None;
        }
        slot.busy = true;
        slot.epoch += 1;
        Some(slot.stream.take())
    }

    /// Undo a claim that never reached the wire
    pub(crate) fn unclaim(self: &Arc<Self>, stream: Option<TcpStream>) {
        let mut slot = self.slot.lock();
        slot.busy = false;
        match stream {
            Some(stream) => slot.stream = Some(stream),
            None => {
                drop(slot);
                // The claim cancelled any pending dial
                self.schedule_dial(Duration::ZERO);
            }
        }
    }

    /// Run the exchange on its own task and wait on its result
    ///
    /// The exchange owns the slot until the engine replies or the socket
    /// fails; a caller dropping this future does not free the slot early.
    pub(crate) async fn dispatch(
        self: &Arc<Self>,
        stream: Option<TcpStream>,
        payload: Vec<u8>,
    ) -> Result<Response> {
        let (pending_tx, pending_rx) = oneshot::channel();
        let connection = Arc::clone(self);

        tokio::spawn(async move {
            let outcome = connection.exchange(stream, &payload).await;
            // Receiver is gone if the caller abandoned the request
            let _ = pending_tx.send(outcome);
        });

        pending_rx
            .await
            .map_err(|_| WireError::Transport("engine connection closed".to_string()))?
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    async fn exchange(self: Arc<Self>, stream: Option<TcpStream>, payload: &[u8]) -> Result<Response> {
        let outcome = match stream {
            Some(mut stream) => round_trip(&mut stream, payload).await,
            None => match self.dial().await {
                Ok(mut stream) => round_trip(&mut stream, payload).await,
                Err(e) => Err(e),
            },
        };

        match &outcome {
            Ok(_) => tracing::trace!(slot = self.id, "reply complete"),
            Err(e) if e.is_transport() => {
                tracing::debug!(slot = self.id, addr = %self.addr, error = %e, "engine socket failed");
            }
            Err(e) => tracing::debug!(slot = self.id, error = %e, "engine reply rejected"),
        }

        // The socket was consumed either way: free the slot and re-dial.
        self.slot.lock().busy = false;
        self.schedule_dial(self.reconnect_delay);
        outcome
    }

    // =========================================================================
    // Dialing
    // =========================================================================

    async fn dial(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(WireError::transport)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true).map_err(WireError::transport)?;
        Ok(stream)
    }

    fn schedule_dial(self: &Arc<Self>, delay: Duration) {
        let epoch = {
            let mut slot = self.slot.lock();
            slot.epoch += 1;
            slot.epoch
        };
        let weak = Arc::downgrade(self);
        tokio::spawn(Self::redial(weak, epoch, delay));
    }

    /// Dial until a socket is installed or the epoch moves on
    ///
    /// Retries forever at the fixed delay; stops once the connection itself
    /// has been dropped.
    async fn redial(weak: Weak<Self>, epoch: u64, mut delay: Duration) {
        loop {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let Some(connection) = weak.upgrade() else {
                return;
            };
            if connection.slot.lock().epoch != epoch {
                return;
            }

            match connection.dial().await {
                Ok(stream) => {
                    connection.install(epoch, stream);
                    return;
                }
                Err(e) => {
                    let failures = {
                        let mut slot = connection.slot.lock();
                        slot.failures += 1;
                        slot.failures
                    };
                    if failures == 1 {
                        tracing::warn!(slot = connection.id, addr = %connection.addr, error = %e, "engine connect failed, retrying");
                    } else {
                        tracing::debug!(slot = connection.id, failures, error = %e, "engine connect retry failed");
                    }
                    delay = connection.reconnect_delay;
                }
            }
        }
    }

    fn install(&self, epoch: u64, stream: TcpStream) {
        let mut slot = self.slot.lock();
        if slot.epoch != epoch || slot.busy {
            // Claimed while dialing; the claimant dials its own socket
            return;
        }
        slot.stream = Some(stream);
        slot.failures = 0;
        tracing::debug!(slot = self.id, addr = %self.addr, "engine connection ready");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("state", &self.state())
            .finish()
    }
}
