//! std::fs backed storage

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use super::{OpenMode, Storage, StorageHandle};

/// Storage on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl StorageHandle for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl Storage for FsStorage {
    type Handle = File;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::WriteTruncate => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true),
        };
        options.open(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}
