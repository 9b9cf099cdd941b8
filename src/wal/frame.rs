//! WAL Frame codec
//!
//! Splits a flat byte stream into `opcode + length + payload` frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Header size: 1 byte opcode + 4 bytes little-endian payload length
pub const FRAME_HEADER_SIZE: usize = 5;

/// Opcodes written by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalOp {
    Insert,
    Update,
    Delete,
    /// Any opcode the engine does not define; kept verbatim
    Other(u8),
}

impl From<u8> for WalOp {
    fn from(byte: u8) -> Self {
        match byte {
            1 => WalOp::Insert,
            2 => WalOp::Update,
            3 => WalOp::Delete,
            other => WalOp::Other(other),
        }
    }
}

impl From<WalOp> for u8 {
    fn from(op: WalOp) -> Self {
        match op {
            WalOp::Insert => 1,
            WalOp::Update => 2,
            WalOp::Delete => 3,
            WalOp::Other(byte) => byte,
        }
    }
}

/// One log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalFrame {
    pub opcode: u8,
    pub payload: Bytes,
}

impl WalFrame {
    pub fn new(opcode: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode: opcode.into(),
            payload: payload.into(),
        }
    }

    pub fn op(&self) -> WalOp {
        WalOp::from(self.opcode)
    }

    /// Size of the frame on disk
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Append the encoded frame to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        let len = u32::try_from(self.payload.len()).map_err(|_| {
            WireError::Serialization(format!(
                "WAL payload too large: {} bytes (max {})",
                self.payload.len(),
                u32::MAX
            ))
        })?;

        buf.reserve(self.encoded_len());
        buf.put_u8(self.opcode);
        buf.put_u32_le(len);
        buf.put_slice(&self.payload);
        Ok(())
    }
}

/// Encode a single frame
pub fn encode_frame(frame: &WalFrame) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(frame.encoded_len());
    frame.encode_into(&mut buf)?;
    Ok(buf.freeze())
}

/// Decode every complete frame in `data`
///
/// A trailing partial header or payload ends decoding silently.
pub fn decode_frames(data: impl Into<Bytes>) -> Vec<WalFrame> {
    FrameDecoder::new(data).collect()
}

/// Iterator over the frames of a WAL buffer
///
/// Stops at the first frame that does not fit in the remaining bytes and
/// never yields an error: the log is treated as ending at the last
/// complete frame.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    remaining: Bytes,
    consumed: usize,
    truncated: bool,
}

impl FrameDecoder {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            remaining: data.into(),
            consumed: 0,
            truncated: false,
        }
    }

    /// Bytes covered by the frames decoded so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Whether decoding stopped on an incomplete trailing frame
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn stop(&mut self) {
        self.truncated = true;
        self.remaining.clear();
    }
}

impl Iterator for FrameDecoder {
    type Item = WalFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        if self.remaining.len() < FRAME_HEADER_SIZE {
            self.stop();
            return None;
        }

        // Peek the header so a truncated frame leaves no partial state
        let mut header = &self.remaining[..FRAME_HEADER_SIZE];
        let opcode = header.get_u8();
        let len = header.get_u32_le() as usize;

        if self.remaining.len() - FRAME_HEADER_SIZE < len {
            self.stop();
            return None;
        }

        self.remaining.advance(FRAME_HEADER_SIZE);
        let payload = self.remaining.split_to(len);
        self.consumed += FRAME_HEADER_SIZE + len;

        Some(WalFrame { opcode, payload })
    }
}
