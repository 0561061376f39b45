//! Configuration for fifolog
//!
//! Centralized configuration with sensible defaults for small devices.

use std::path::PathBuf;

use crate::error::{FifoLogError, Result};

/// Main configuration for a LogStore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the log file. The defragmentation temp file lives next to it:
    ///   {path}{temp_suffix}
    pub path: PathBuf,

    /// Suffix appended to `path` for the defragmentation temp file
    pub temp_suffix: String,

    /// Sync strategy: when to fsync mutating writes
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Scan Configuration
    // -------------------------------------------------------------------------
    /// Read-ahead buffer of the forward line scanner (in bytes)
    pub scan_buffer_size: usize,

    /// Block size of the backward scan used by `get_last` (in bytes)
    pub reverse_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Fragmentation ratio checked after every deletion; `None` disables
    /// automatic defragmentation
    pub auto_defrag_threshold: Option<f32>,

    /// Threshold used by `should_defragment_default`
    pub defrag_threshold: f32,
}

/// Durability strategy for mutating writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// flush to the OS only, let it decide when data hits the medium
    OsBuffered,

    /// fsync after every append, tombstone and compaction (safest, slowest)
    EveryWrite,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./fifolog.log"),
            temp_suffix: ".tmp".to_string(),
            sync_strategy: SyncStrategy::OsBuffered,
            scan_buffer_size: 64,
            reverse_buffer_size: 512,
            auto_defrag_threshold: Some(0.6),
            defrag_threshold: 0.7,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the temporary file written during defragmentation
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(&self.temp_suffix);
        PathBuf::from(name)
    }

    /// Reject values the scanners cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scan_buffer_size == 0 {
            return Err(FifoLogError::Config("scan_buffer_size must be > 0".into()));
        }
        if self.reverse_buffer_size == 0 {
            return Err(FifoLogError::Config(
                "reverse_buffer_size must be > 0".into(),
            ));
        }
        if self.temp_suffix.is_empty() {
            return Err(FifoLogError::Config("temp_suffix must not be empty".into()));
        }
        if let Some(threshold) = self.auto_defrag_threshold {
            check_ratio("auto_defrag_threshold", threshold)?;
        }
        check_ratio("defrag_threshold", self.defrag_threshold)
    }
}

fn check_ratio(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FifoLogError::Config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the temp file suffix used by defragmentation
    pub fn temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.temp_suffix = suffix.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the forward scan read-ahead size (in bytes)
    pub fn scan_buffer_size(mut self, size: usize) -> Self {
        self.config.scan_buffer_size = size;
        self
    }

    /// Set the reverse scan block size (in bytes)
    pub fn reverse_buffer_size(mut self, size: usize) -> Self {
        self.config.reverse_buffer_size = size;
        self
    }

    /// Set the post-deletion defragmentation threshold
    pub fn auto_defrag_threshold(mut self, threshold: Option<f32>) -> Self {
        self.config.auto_defrag_threshold = threshold;
        self
    }

    /// Set the default threshold for `should_defragment_default`
    pub fn defrag_threshold(mut self, threshold: f32) -> Self {
        self.config.defrag_threshold = threshold;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
