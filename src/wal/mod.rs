//! Write-Ahead Log (WAL) Module
//!
//! Reads (and, for tooling, writes) the engine's binary operation log.
//!
//! ## Responsibilities
//! - Frame codec tolerant of truncated tails
//! - Discovery of log files under a directory tree
//! - Translation of logged records into engine commands
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Entry 1                                  │
//! │ ┌────────┬─────────────┬───────────────┐ │
//! │ │ Op (1) │ Len (4, LE) │ JSON payload  │ │
//! │ └────────┴─────────────┴───────────────┘ │
//! ├──────────────────────────────────────────┤
//! │ Entry 2 ...                              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! No file header, footer, entry count or checksum: a well-framed payload
//! that is not valid JSON is dropped, not reported as corruption.

mod frame;
mod record;
mod reader;
mod writer;

pub use frame::{decode_frames, encode_frame, FrameDecoder, WalFrame, WalOp, FRAME_HEADER_SIZE};
pub use record::WalRecord;
pub use reader::{discover_wal_files, WalReader, WalScan, WAL_SUFFIX};
pub use writer::WalWriter;
