//! Tombstone Module
//!
//! Logical deletion by overwriting the first byte of a slot in place.
//!
//! ## Responsibilities
//! - Mark one slot (`remove`) or the oldest N slots (`remove_first`) deleted
//! - Never change a slot's length, so every cursor stays valid
//! - Decrement the live count once per confirmed tombstone write
//! - Check fragmentation afterwards and compact when over the threshold

use std::io::{Seek, SeekFrom};

use tracing::{debug, warn};

use crate::codec::RecordCodec;
use crate::config::SyncStrategy;
use crate::error::{FifoLogError, Result};
use crate::slot::TOMBSTONE;
use crate::storage::{OpenMode, Storage, StorageHandle};
use crate::store::{commit_write, LogStore};

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Remove the live record at `index`, returning its payload
    ///
    /// Returns `Ok(None)` on an empty log and `IndexOutOfBounds` for an
    /// index past the end; neither touches the file.
    pub fn remove(&mut self, index: usize) -> Result<Option<String>> {
        if self.is_empty() {
            debug!(index, "remove on empty log");
            return Ok(None);
        }
        self.check_index(index)?;

        let (payload, cursor) = match self.read_line(index)? {
            Some(found) => found,
            None => {
                warn!(index, size = self.current_size, "log ended before record");
                return Err(FifoLogError::ShortRead { index });
            }
        };

        {
            let mut file = self.open_file(OpenMode::ReadWrite)?;
            mark_deleted(&mut file, cursor, self.config.sync_strategy).map_err(|e| {
                warn!(index, cursor, error = %e, "failed to write tombstone");
                FifoLogError::Io(e)
            })?;
        }

        self.current_size -= 1;
        debug!(index, cursor, size = self.current_size, "tombstoned record");

        self.auto_defragment();
        Ok(Some(payload))
    }

    /// Remove the oldest `count` live records, returning how many went
    ///
    /// Fewer than `count` live records is not an error: all of them are
    /// removed and their number returned.
    pub fn remove_first(&mut self, count: usize) -> Result<usize> {
        if self.is_empty() {
            debug!(count, "remove_first on empty log");
            return Ok(0);
        }
        let wanted = count.min(self.current_size);

        let mut cursors = Vec::with_capacity(wanted);
        for header in self.slot_headers()? {
            if cursors.len() == wanted {
                break;
            }
            let header = header?;
            if header.is_live() {
                cursors.push(header.offset);
            }
        }

        let mut removed = 0;
        {
            let mut file = self.open_file(OpenMode::ReadWrite)?;
            for &cursor in &cursors {
                if let Err(e) = mark_deleted(&mut file, cursor, SyncStrategy::OsBuffered) {
                    warn!(cursor, removed, error = %e, "failed to write tombstone");
                    return Err(FifoLogError::Io(e));
                }
                self.current_size -= 1;
                removed += 1;
            }
            if self.config.sync_strategy == SyncStrategy::EveryWrite {
                file.sync().map_err(|e| {
                    warn!(removed, error = %e, "failed to sync tombstones");
                    FifoLogError::Io(e)
                })?;
            }
        }

        debug!(removed, size = self.current_size, "tombstoned oldest records");
        self.auto_defragment();
        Ok(removed)
    }

    /// Compact when the post-deletion threshold is reached
    ///
    /// The tombstones are already committed, so a failure here is logged
    /// and left for the next deletion or an explicit `defragment`.
    fn auto_defragment(&mut self) {
        let Some(threshold) = self.config.auto_defrag_threshold else {
            return;
        };
        match self.should_defragment(threshold) {
            Ok(true) => {
                if let Err(e) = self.defragment() {
                    warn!(error = %e, "automatic defragmentation failed");
                }
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "failed to measure fragmentation"),
        }
    }
}

/// Overwrite the first byte of the slot at `cursor`
fn mark_deleted<H: StorageHandle>(
    file: &mut H,
    cursor: u64,
    strategy: SyncStrategy,
) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(cursor))?;
    commit_write(file, &[TOMBSTONE], strategy)
}
