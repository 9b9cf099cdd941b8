//! Protocol codec
//!
//! Encoding and stream helpers for the engine's wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! client ──► {"action":"find",...}          (raw JSON, no length prefix)
//! client ◄── [...] | {"status":"ok",...}     (raw JSON)
//! client ◄── FIN                             (engine half-closes: reply complete)
//! ```
//!
//! There is no request identifier, so one socket carries at most one
//! outstanding request.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, WireError};
use super::{normalize, Command, Response};

/// Initial capacity of the reply buffer
const REPLY_BUFFER_CAPACITY: usize = 4 * 1024;

/// Serialize a command to its wire bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    serde_json::to_vec(command).map_err(|e| WireError::Serialization(e.to_string()))
}

/// Write encoded command bytes to the socket
pub async fn write_command<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await.map_err(WireError::transport)?;
    writer.flush().await.map_err(WireError::transport)?;
    Ok(())
}

/// Accumulate reply bytes until the engine signals end-of-stream
///
/// The buffer may be empty: an engine that closes without writing has
/// still answered.
pub async fn read_reply<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(REPLY_BUFFER_CAPACITY);
    reader.read_to_end(&mut buffer).await.map_err(WireError::transport)?;
    Ok(buffer)
}

/// Full request/reply cycle on one stream: write, read to EOF, normalize
pub async fn round_trip<S>(stream: &mut S, payload: &[u8]) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_command(stream, payload).await?;
    let reply = read_reply(stream).await?;
    normalize(&reply)
}
