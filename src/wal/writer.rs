//! WAL Writer
//!
//! Appends frames to a WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use serde_json::Value;

use crate::error::{Result, WireError};
use super::{WalFrame, WalOp};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    frames_written: u64,
    scratch: BytesMut,
}

impl WalWriter {
    /// Open or create a WAL file, appending after any existing entries
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            frames_written: 0,
            scratch: BytesMut::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a raw frame
    pub fn append(&mut self, frame: &WalFrame) -> Result<()> {
        self.scratch.clear();
        frame.encode_into(&mut self.scratch)?;
        self.writer.write_all(&self.scratch)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Append a JSON record under the given opcode
    pub fn append_record(&mut self, op: WalOp, record: &Value) -> Result<()> {
        let payload =
            serde_json::to_vec(record).map_err(|e| WireError::Serialization(e.to_string()))?;
        self.append(&WalFrame::new(op, payload))
    }

    /// Flush buffered frames and fsync the file
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Frames appended through this writer
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}
