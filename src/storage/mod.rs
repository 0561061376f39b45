//! Storage Module
//!
//! File primitives the log is built on.
//!
//! ## Responsibilities
//! - Existence checks, open in one of four modes, remove, rename
//! - Handles are plain `Read + Write + Seek` values: dropping one closes it,
//!   so every early return releases its file
//!
//! Storage knows nothing about slots or tombstones; the store owns all
//! format interpretation. Tests swap in their own `Storage` to inject faults.

mod fs;

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

pub use fs::FsStorage;

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read only, file must exist
    Read,

    /// Create or truncate, then write
    WriteTruncate,

    /// Create if missing, every write lands at the end
    Append,

    /// Read and overwrite in place, file must exist
    ReadWrite,
}

/// An open file
pub trait StorageHandle: Read + Write + Seek {
    /// Push written data down to the medium
    fn sync(&mut self) -> io::Result<()>;

    /// Total length in bytes; the cursor position is preserved
    fn size(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }
}

/// Block/file storage collaborator
pub trait Storage {
    type Handle: StorageHandle;

    /// Whether a file exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Open `path` in the given mode
    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<Self::Handle>;

    /// Create a directory and all its parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Delete a file
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Move `from` to `to`, replacing `to` if present
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
