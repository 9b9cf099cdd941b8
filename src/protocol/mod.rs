//! Protocol Module
//!
//! Defines the vocabulary exchanged with the storage engine.
//!
//! ## Request Format
//! A single JSON object per request: a required `action` plus
//! action-specific fields (`userId`, `dbName`, `collection`, `filter`,
//! `data`, `update`, `ops`).
//!
//! ## Reply Shapes
//! - `[doc, ...]`                 - ordered result documents
//! - `{"status":"ok","data":[..]}` - envelope around result documents
//! - `{...}`                      - single object (status / admin replies)
//!
//! The reply ends when the engine half-closes its side of the socket.

mod command;
mod response;
mod codec;

pub use command::{Action, Command};
pub use response::{classify, normalize, Response};
pub use codec::{encode_command, read_reply, round_trip, write_command};
