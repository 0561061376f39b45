//! Forward Scan
//!
//! Line-by-line iteration over the log, skipping tombstoned slots where the
//! caller asks for live records only.
//!
//! Two walks share the same cursor bookkeeping:
//! - [`SlotHeaders`] sees offset, length and liveness only. Memory is the
//!   read-ahead buffer, whatever the record length. Counting, metrics,
//!   cursor collection and compaction use it.
//! - [`SlotScanner`] also returns each line's bytes, for callers that want
//!   payloads.

use std::io::{BufRead, BufReader, ErrorKind, Read};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::codec::RecordCodec;
use crate::error::{FifoLogError, Result};
use crate::slot::{Slot, SlotHeader, TERMINATOR};
use crate::storage::{OpenMode, Storage};
use crate::store::LogStore;

use super::read_payload_at;

/// Iterator over slot headers in file order, without buffering lines
pub struct SlotHeaders<R> {
    reader: BufReader<R>,
    cursor: u64,
    done: bool,
}

impl<R: Read> SlotHeaders<R> {
    /// Wrap an open handle positioned at offset 0
    pub fn new(handle: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, handle),
            cursor: 0,
            done: false,
        }
    }

    fn next_header(&mut self) -> std::io::Result<Option<SlotHeader>> {
        let mut header = SlotHeader {
            offset: self.cursor,
            len: 0,
            first: None,
            blank: true,
            terminated: false,
        };

        loop {
            let chunk = match self.reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                self.done = true;
                if header.len == 0 {
                    return Ok(None);
                }
                break;
            }

            let (content, used) = match chunk.iter().position(|&b| b == TERMINATOR) {
                Some(i) => (i, i + 1),
                None => (chunk.len(), chunk.len()),
            };
            if header.len == 0 && content > 0 {
                header.first = Some(chunk[0]);
            }
            header.blank &= chunk[..content].iter().all(u8::is_ascii_whitespace);
            header.terminated = used > content;

            self.reader.consume(used);
            header.len += used as u64;
            if header.terminated {
                break;
            }
        }

        self.cursor += header.len;
        Ok(Some(header))
    }
}

impl<R: Read> Iterator for SlotHeaders<R> {
    type Item = Result<SlotHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_header() {
            Ok(header) => header.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(FifoLogError::Io(e)))
            }
        }
    }
}

/// Iterator over every slot of a log file in file order
///
/// Memory use is the read-ahead buffer plus the current line. The scan can
/// be restarted only by opening a new scanner.
pub struct SlotScanner<R> {
    reader: BufReader<R>,
    /// Offset of the next slot's first byte
    cursor: u64,
    done: bool,
}

impl<R: Read> SlotScanner<R> {
    /// Wrap an open handle positioned at offset 0
    pub fn new(handle: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, handle),
            cursor: 0,
            done: false,
        }
    }

    /// Bytes consumed so far, terminators included
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
}

impl<R: Read> Iterator for SlotScanner<R> {
    type Item = Result<Slot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut line = Vec::new();
        let read = match self.reader.read_until(TERMINATOR, &mut line) {
            Ok(0) => {
                self.done = true;
                return None;
            }
            Ok(n) => n as u64,
            Err(e) => {
                self.done = true;
                return Some(Err(FifoLogError::Io(e)));
            }
        };

        if line.last() == Some(&TERMINATOR) {
            line.pop();
        }

        let slot = Slot {
            offset: self.cursor,
            line,
            len: read,
        };
        self.cursor += read;
        Some(Ok(slot))
    }
}

/// Iterator over the payloads of live records, oldest first
pub struct LiveRecords<R> {
    slots: SlotScanner<R>,
}

impl<R: Read> Iterator for LiveRecords<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.slots.next()? {
                Ok(slot) if slot.is_live() => return Some(Ok(slot.payload())),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<C: RecordCodec, S: Storage> LogStore<C, S> {
    /// Walk slot headers only; memory does not grow with record length
    pub fn slot_headers(&self) -> Result<SlotHeaders<S::Handle>> {
        let file = self.open_file(OpenMode::Read)?;
        Ok(SlotHeaders::new(file, self.config.scan_buffer_size))
    }

    /// Scan every slot, tombstoned ones included, with their offsets
    pub fn slots(&self) -> Result<SlotScanner<S::Handle>> {
        let file = self.open_file(OpenMode::Read)?;
        Ok(SlotScanner::new(file, self.config.scan_buffer_size))
    }

    /// Scan the payloads of live records in FIFO order
    pub fn iter(&self) -> Result<LiveRecords<S::Handle>> {
        Ok(LiveRecords {
            slots: self.slots()?,
        })
    }

    /// Find live record `n` and its cursor
    ///
    /// Does not check `n` against the cached size: an index past the end
    /// exhausts the file and yields `None`.
    pub(crate) fn read_line(&self, n: usize) -> Result<Option<(String, u64)>> {
        let mut live = 0;
        let mut cursor = None;
        for header in self.slot_headers()? {
            let header = header?;
            if !header.is_live() {
                continue;
            }
            if live == n {
                cursor = Some(header.offset);
                break;
            }
            live += 1;
        }

        let Some(cursor) = cursor else {
            return Ok(None);
        };
        let mut file = self.open_file(OpenMode::Read)?;
        let payload = read_payload_at(&mut file, cursor, self.config.scan_buffer_size)?;
        Ok(Some((payload, cursor)))
    }

    /// Payload of the live record at `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Result<String> {
        self.check_index(index)?;
        match self.read_line(index)? {
            Some((payload, _)) => Ok(payload),
            None => {
                warn!(index, size = self.current_size, "log ended before record");
                Err(FifoLogError::ShortRead { index })
            }
        }
    }

    /// Decode the live record at `index`
    pub fn get_as<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let payload = self.get(index)?;
        self.decode_logged(&payload)
    }

    /// Decode the first `count` live records, all or nothing
    ///
    /// Asks for `min(count, len())` records. A short file or a record that
    /// fails to decode aborts the whole call; a partial vector is never
    /// returned.
    pub fn get_first<T: DeserializeOwned>(&self, count: usize) -> Result<Vec<T>> {
        let wanted = count.min(self.current_size);
        let mut records = Vec::with_capacity(wanted);
        if wanted == 0 {
            return Ok(records);
        }

        for payload in self.iter()?.take(wanted) {
            records.push(self.decode_logged(&payload?)?);
        }

        if records.len() < wanted {
            warn!(wanted, found = records.len(), "log ended before requested records");
            return Err(FifoLogError::ShortRead {
                index: records.len(),
            });
        }
        Ok(records)
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.current_size {
            return Ok(());
        }
        warn!(index, size = self.current_size, "index out of bounds");
        Err(FifoLogError::IndexOutOfBounds {
            index,
            size: self.current_size,
        })
    }

    fn decode_logged<T: DeserializeOwned>(&self, payload: &str) -> Result<T> {
        self.codec.decode(payload).inspect_err(|e| {
            warn!(error = %e, "failed to decode record");
        })
    }
}
