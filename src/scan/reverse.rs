//! Reverse Scan
//!
//! Finds the newest live record by reading fixed-size blocks from the end
//! of the file towards the start.
//!
//! ## Algorithm
//! ```text
//!   file:  ... {"a":1}\n$"b":2}\n{"c":3}\n
//!                                        ^ pos starts at file size
//!   1. step pos back by min(block, pos) and read that window
//!   2. walk the window backwards looking for '\n'
//!        '\n' at the last index of the window -> read the line after it,
//!            accept if non-empty and not tombstoned
//!        '\n' inside the window -> accept the line after it if the byte
//!            following '\n' is not the tombstone and the line is non-empty
//!        index 0 of the window at file offset 0 -> read line 0,
//!            accept if non-empty and not tombstoned
//!   3. nothing accepted: move to the previous window
//! ```
//!
//! Candidate lines are read straight from the file, so a record longer than
//! the block is still returned whole.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::codec::RecordCodec;
use crate::error::{FifoLogError, Result};
use crate::slot::{TERMINATOR, TOMBSTONE};
use crate::storage::{OpenMode, Storage, StorageHandle};
use crate::store::LogStore;

use super::read_payload_at;

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Payload of the newest live record, `None` if the log is empty
    pub fn get_last(&self) -> Result<Option<String>> {
        if self.is_empty() {
            debug!("get_last on empty log");
            return Ok(None);
        }

        let mut file = self.open_file(OpenMode::Read)?;
        let file_size = file.size().map_err(|e| {
            warn!(error = %e, "failed to read log size");
            FifoLogError::Io(e)
        })?;
        let mut buffer = vec![0u8; self.config.reverse_buffer_size];
        let read_ahead = self.config.scan_buffer_size;

        let mut pos = file_size;
        while pos > 0 {
            let read_len = (buffer.len() as u64).min(pos) as usize;
            pos -= read_len as u64;

            let window = &mut buffer[..read_len];
            read_window(&mut file, pos, window).map_err(|e| {
                warn!(pos, read_len, error = %e, "failed to read block");
                FifoLogError::Io(e)
            })?;

            for i in (0..read_len).rev() {
                let candidate = if window[i] == TERMINATOR {
                    let start = pos + 1 + i as u64;
                    if i == read_len - 1 {
                        accept_unmarked(read_payload_at(&mut file, start, read_ahead)?)
                    } else if window[i + 1] != TOMBSTONE {
                        // the read value itself is not re-checked on this branch
                        Some(read_payload_at(&mut file, start, read_ahead)?)
                            .filter(|p| !p.is_empty())
                    } else {
                        None
                    }
                } else if i == 0 && pos == 0 {
                    accept_unmarked(read_payload_at(&mut file, 0, read_ahead)?)
                } else {
                    None
                };

                if candidate.is_some() {
                    return Ok(candidate);
                }
            }
        }

        warn!(size = self.current_size, file_size, "no live record found scanning backwards");
        Ok(None)
    }
}

fn accept_unmarked(payload: String) -> Option<String> {
    match payload.as_bytes().first() {
        Some(&b) if b != TOMBSTONE => Some(payload),
        _ => None,
    }
}

fn read_window<H: Read + Seek>(file: &mut H, pos: u64, window: &mut [u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(pos))?;
    file.read_exact(window)
}
