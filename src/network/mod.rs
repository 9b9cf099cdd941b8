//! Network Module
//!
//! TCP client side of the engine protocol.
//!
//! ## Architecture
//! - Fixed-size pool of long-lived connections, one request in flight each
//! - One-shot fallback sockets when the pool is saturated
//! - `EngineClient` ties both together behind `send_command`

mod connection;
mod pool;
mod fallback;
mod client;

pub use connection::{Connection, ConnectionState};
pub use pool::{ConnectionPool, PoolLease};
pub use fallback::send_once;
pub use client::EngineClient;
