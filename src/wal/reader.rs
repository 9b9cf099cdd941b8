//! WAL Reader
//!
//! Finds log files on disk and decodes them into records.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::Result;
use super::{FrameDecoder, WalRecord};

/// File name suffix of engine log files
pub const WAL_SUFFIX: &str = ".wal";

/// Recursively collect files under `root` whose name ends with `suffix`
///
/// Entries are visited in name order, descending into directories as they
/// are met. A missing root yields no files; any other I/O failure is an
/// error.
pub fn discover_wal_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    match fs::metadata(root) {
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
        Ok(_) => {}
    }
    walk(root, suffix, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, suffix: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, suffix, found)?;
        } else if file_type.is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            found.push(path);
        }
    }
    Ok(())
}

/// Records decoded from one WAL file
#[derive(Debug, Default)]
pub struct WalScan {
    /// Records in file order
    pub records: Vec<WalRecord>,

    /// Complete frames found
    pub frames: usize,

    /// Frames whose payload was not valid JSON
    pub malformed: usize,

    /// Whether the file ended inside a frame
    pub truncated: bool,
}

/// Reads a whole WAL file into memory
pub struct WalReader {
    path: PathBuf,
    data: Bytes,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            data: Bytes::from(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate over the raw frames
    pub fn frames(&self) -> FrameDecoder {
        FrameDecoder::new(self.data.clone())
    }

    /// Decode every frame payload, skipping the ones that fail to parse
    pub fn scan(&self) -> WalScan {
        let mut scan = WalScan::default();
        let mut frames = self.frames();

        for (index, frame) in frames.by_ref().enumerate() {
            scan.frames += 1;
            match WalRecord::parse(&frame.payload) {
                Ok(record) => scan.records.push(record),
                Err(e) => {
                    scan.malformed += 1;
                    tracing::warn!(file = %self.path.display(), entry = index, error = %e, "skipping malformed WAL entry");
                }
            }
        }

        scan.truncated = frames.is_truncated();
        if scan.truncated {
            tracing::debug!(
                file = %self.path.display(),
                offset = frames.consumed(),
                "WAL file ends inside a frame, ignoring the tail"
            );
        }
        scan
    }
}
