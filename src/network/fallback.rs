//! Fallback Socket
//!
//! One-shot connection used when every pooled slot is busy: connect, write,
//! read to end-of-stream, normalize, close.

use tokio::net::TcpStream;

use crate::error::{Result, WireError};
use crate::protocol::{round_trip, Response};

/// Send pre-encoded command bytes over a fresh socket
pub async fn send_once(addr: &str, payload: &[u8]) -> Result<Response> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(WireError::transport)?;
    stream.set_nodelay(true).map_err(WireError::transport)?;

    tracing::trace!(addr = %addr, bytes = payload.len(), "fallback socket connected");
    round_trip(&mut stream, payload).await
}
