//! # fifolog
//!
//! An append-only FIFO record log for devices with little memory:
//! - One record per line, appended at the end of a single file
//! - Random access by insertion position (oldest = 0)
//! - Deletion by tombstoning a slot's first byte in place
//! - Defragmentation that rewrites the file with live slots only
//! - Every scan runs with small fixed-size buffers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         LogStore                            │
//! │        push / get / get_last / remove / defragment          │
//! └───────┬──────────────┬──────────────┬──────────────┬────────┘
//!         │              │              │              │
//!         ▼              ▼              ▼              ▼
//!  ┌─────────────┐ ┌───────────┐ ┌─────────────┐ ┌───────────┐
//!  │ Forward /   │ │ Tombstone │ │ Compaction  │ │  Metrics  │
//!  │ Reverse Scan│ │ (in place)│ │ (tmp+rename)│ │(frag ratio│
//!  └──────┬──────┘ └─────┬─────┘ └──────┬──────┘ └─────┬─────┘
//!         └──────────────┴───────┬──────┴──────────────┘
//!                                ▼
//!                  ┌──────────────────────────┐
//!                  │ Storage (files) + Codec  │
//!                  └──────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fifolog::LogStore;
//! use serde_json::{json, Value};
//!
//! let mut log = LogStore::open_path(std::path::Path::new("/sd/readings.log"))?;
//! log.push(&json!({"test": "a"}))?;
//! let first: Value = log.get_as(0)?;
//! assert_eq!(first, json!({"test": "a"}));
//! # Ok::<(), fifolog::FifoLogError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod storage;
pub mod slot;
pub mod scan;
pub mod store;
mod tombstone;
pub mod compaction;
pub mod metrics;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FifoLogError, Result};
pub use config::{Config, SyncStrategy};
pub use codec::{BincodeLineCodec, JsonLineCodec, RecordCodec};
pub use compaction::DefragOutcome;
pub use metrics::Stats;
pub use shared::SharedLogStore;
pub use store::LogStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fifolog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
