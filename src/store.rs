//! Store Module
//!
//! The log file manager that every other component hangs off.
//!
//! ## Responsibilities
//! - Own the log file path and make sure the file exists
//! - Append encoded records, one slot per record
//! - Keep the cached live-record count in step with the file
//! - Clear the log by recreating the file
//!
//! Reads, deletions, compaction and metrics are implemented as further
//! `impl LogStore` blocks in their own modules.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{JsonLineCodec, RecordCodec};
use crate::config::{Config, SyncStrategy};
use crate::error::{FifoLogError, Result};
use crate::slot::{TERMINATOR, TOMBSTONE};
use crate::storage::{FsStorage, OpenMode, Storage, StorageHandle};

/// Append-only FIFO record log on a single file
///
/// ## Concurrency Model: single owner
///
/// - Mutating operations take `&mut self`, reads take `&self`
/// - Nothing is locked internally; share a store between threads through
///   [`crate::SharedLogStore`]
///
/// ## State
///
/// The only thing kept in memory is `current_size`. It is computed with one
/// full scan when the store is opened and updated by every mutation after
/// the write that justifies it has succeeded.
pub struct LogStore<C = JsonLineCodec, S = FsStorage> {
    /// Store configuration (path, buffer sizes, thresholds)
    pub(crate) config: Config,

    /// Record encoder/decoder
    pub(crate) codec: C,

    /// File primitives
    pub(crate) storage: S,

    /// Number of live slots in the file
    pub(crate) current_size: usize,
}

impl LogStore<JsonLineCodec, FsStorage> {
    /// Open or create a JSON-line log on the local filesystem
    pub fn open(config: Config) -> Result<Self> {
        Self::with_parts(config, JsonLineCodec, FsStorage)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().path(path).build())
    }
}

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Open or create a log with an explicit codec and storage
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the parent directory and an empty log file if missing
    /// 3. Remove a temp file left behind by an interrupted defragmentation
    /// 4. Count live records with one forward scan
    pub fn with_parts(config: Config, codec: C, storage: S) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                storage.create_dir_all(parent)?;
            }
        }

        let mut store = Self {
            config,
            codec,
            storage,
            current_size: 0,
        };

        store.ensure_exists()?;
        store.discard_stale_temp();
        store.recount()?;

        debug!(
            path = %store.config.path.display(),
            size = store.current_size,
            "opened log"
        );
        Ok(store)
    }

    /// Create a zero-length log file if none exists (idempotent)
    pub fn ensure_exists(&self) -> Result<()> {
        if self.storage.exists(&self.config.path) {
            return Ok(());
        }
        self.open_file(OpenMode::Append)?;
        Ok(())
    }

    /// Recompute the live-record count from disk
    ///
    /// Only needed if the file was modified behind the store's back.
    pub fn recount(&mut self) -> Result<usize> {
        let mut live = 0;
        for header in self.slot_headers()? {
            if header?.is_live() {
                live += 1;
            }
        }
        self.current_size = live;
        Ok(live)
    }

    /// Append a record
    ///
    /// The record is encoded to one line and written with its terminator.
    /// The live count only grows once the write has been confirmed.
    pub fn push<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        let line = self.codec.encode(record).inspect_err(|e| {
            warn!(error = %e, "failed to encode record");
        })?;
        validate_line(&line)?;

        let mut file = self.open_file(OpenMode::Append)?;

        let mut bytes = line.into_bytes();
        bytes.push(TERMINATOR);
        commit_write(&mut file, &bytes, self.config.sync_strategy).map_err(|e| {
            warn!(error = %e, "failed to append record");
            FifoLogError::Io(e)
        })?;

        self.current_size += 1;
        debug!(size = self.current_size, bytes = bytes.len(), "appended record");
        Ok(())
    }

    /// Delete every record by recreating an empty log file
    ///
    /// If the file cannot be deleted nothing changes, neither on disk nor
    /// in the cached count.
    pub fn clear(&mut self) -> Result<()> {
        if self.storage.exists(&self.config.path) {
            self.storage.remove(&self.config.path).map_err(|e| {
                warn!(path = %self.config.path.display(), error = %e, "failed to clear log");
                FifoLogError::Io(e)
            })?;
        }

        // old contents are gone: the count follows even if recreation fails
        self.current_size = 0;
        self.open_file(OpenMode::WriteTruncate)?;

        info!(path = %self.config.path.display(), "cleared log");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of live records
    pub fn len(&self) -> usize {
        self.current_size
    }

    /// Whether the log holds no live records (no file access)
    pub fn is_empty(&self) -> bool {
        self.current_size == 0
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the record codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    // =========================================================================
    // Crate Helpers
    // =========================================================================

    /// Open the log file, logging the failure before it is returned
    pub(crate) fn open_file(&self, mode: OpenMode) -> Result<S::Handle> {
        self.storage.open(&self.config.path, mode).map_err(|e| {
            warn!(
                path = %self.config.path.display(),
                ?mode,
                error = %e,
                "failed to open log file"
            );
            FifoLogError::Io(e)
        })
    }

    /// Path of the defragmentation temp file
    pub(crate) fn temp_path(&self) -> PathBuf {
        self.config.temp_path()
    }

    /// Drop a temp file from a compaction that never reached its rename
    fn discard_stale_temp(&self) {
        let temp_path = self.temp_path();
        if !self.storage.exists(&temp_path) {
            return;
        }
        match self.storage.remove(&temp_path) {
            Ok(()) => info!(path = %temp_path.display(), "removed stale defragmentation file"),
            Err(e) => warn!(
                path = %temp_path.display(),
                error = %e,
                "failed to remove stale defragmentation file"
            ),
        }
    }
}

/// Write `bytes` and push them to the OS, fsyncing when configured to
pub(crate) fn commit_write<H: StorageHandle>(
    handle: &mut H,
    bytes: &[u8],
    strategy: SyncStrategy,
) -> io::Result<()> {
    handle.write_all(bytes)?;
    handle.flush()?;
    if strategy == SyncStrategy::EveryWrite {
        handle.sync()?;
    }
    Ok(())
}

/// An encoded record must fit in exactly one live slot
fn validate_line(line: &str) -> Result<()> {
    let reason = if line.trim().is_empty() {
        Some("record is empty")
    } else if line == "null" {
        Some("record is null")
    } else if line.as_bytes().contains(&TERMINATOR) {
        Some("record contains a line terminator")
    } else if line.as_bytes()[0] == TOMBSTONE {
        Some("record starts with the tombstone marker")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            warn!(reason, "rejected record");
            Err(FifoLogError::Validation(reason.to_string()))
        }
        None => Ok(()),
    }
}
