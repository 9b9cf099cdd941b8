//! # dbwire
//!
//! Client-side transport for a JSON document storage engine reached over
//! raw TCP, plus tooling to replay the engine's write-ahead log:
//! - Fixed-size pool of self-healing connections, one request in flight each
//! - One-shot fallback sockets when the pool is saturated
//! - Reply normalization across the engine's three reply shapes
//! - Truncation-tolerant WAL frame codec and concurrent replay
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Callers (routes, tools)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              EngineClient::send_command                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Pool     │          │  Fallback   │
//!   │ (N sockets) │          │  (one-shot) │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!                ┌─────────────┐        ┌─────────────┐
//!                │   Engine    │ ◄───── │  Replayer   │ ◄── *.wal
//!                │   (TCP)     │        │  (workers)  │
//!                └─────────────┘        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod wal;
pub mod replay;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{WireError, Result};
pub use config::ClientConfig;
pub use network::EngineClient;
pub use protocol::{Action, Command, Response};
pub use replay::{Replayer, ReplayOptions, ReplayOutcome, ReplaySummary};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dbwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
