//! Metrics Module
//!
//! Fragmentation measurements that drive compaction.
//!
//! ```text
//!   fragmentation = 1 - (bytes in live slots) / (file bytes)
//! ```
//!
//! Nothing is cached: each call is one full streaming pass over the file.

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::RecordCodec;
use crate::error::{FifoLogError, Result};
use crate::scan::SlotHeaders;
use crate::storage::{OpenMode, Storage, StorageHandle};
use crate::store::LogStore;

/// Point-in-time view of a log
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    /// Live records
    pub size: usize,

    /// Fragmentation ratio in `[0, 1]`
    pub fragmentation: f32,

    /// Raw file size in bytes
    #[serde(rename = "fileSize")]
    pub file_size: u64,
}

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Share of the file occupied by tombstoned slots, 0.0 for an empty file
    pub fn fragmentation_ratio(&self) -> Result<f32> {
        let mut file = self.open_file(OpenMode::Read)?;
        let file_size = log_size(&mut file)?;
        if file_size == 0 {
            return Ok(0.0);
        }

        let mut live_bytes = 0u64;
        for header in SlotHeaders::new(file, self.config.scan_buffer_size) {
            let header = header?;
            if header.is_live() {
                live_bytes += header.len;
            }
        }

        Ok(((file_size - live_bytes) as f64 / file_size as f64) as f32)
    }

    /// Whether fragmentation is at or above `threshold`
    pub fn should_defragment(&self, threshold: f32) -> Result<bool> {
        let ratio = self.fragmentation_ratio()?;
        if ratio >= threshold {
            debug!(
                ratio = ratio * 100.0,
                threshold = threshold * 100.0,
                "fragmentation over threshold (%)"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// `should_defragment` with the configured default threshold (0.7)
    pub fn should_defragment_default(&self) -> Result<bool> {
        self.should_defragment(self.config.defrag_threshold)
    }

    /// Raw size of the log file in bytes
    pub fn file_size(&self) -> Result<u64> {
        let mut file = self.open_file(OpenMode::Read)?;
        log_size(&mut file)
    }

    /// Snapshot of size, fragmentation and file size; no side effects
    pub fn stats(&self) -> Result<Stats> {
        Ok(Stats {
            size: self.current_size,
            fragmentation: self.fragmentation_ratio()?,
            file_size: self.file_size()?,
        })
    }
}

fn log_size<H: StorageHandle>(file: &mut H) -> Result<u64> {
    file.size().map_err(|e| {
        warn!(error = %e, "failed to read log size");
        FifoLogError::Io(e)
    })
}
