//! Slot Module
//!
//! On-disk format shared by every scanner and writer.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ {"test":"a"}\n            <- live slot      │
//! │ $"test":"b"}\n            <- tombstoned     │
//! │ {"test":"c"}\n            <- live slot      │
//! └─────────────────────────────────────────────┘
//!
//!   Tombstoning overwrites the first byte of the slot in place:
//!     {"test":"b"}\n   ->   $"test":"b"}\n
//!   Slot length and every other offset stay the same.
//! ```

/// Terminates every slot
pub const TERMINATOR: u8 = b'\n';

/// Written over the first byte of a deleted slot
pub const TOMBSTONE: u8 = b'$';

/// One line of the log file, as seen by a scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Byte offset of the slot's first byte (the cursor)
    pub offset: u64,

    /// Line contents without the terminator
    pub line: Vec<u8>,

    /// Bytes occupied on disk, terminator included when present
    pub len: u64,
}

impl Slot {
    /// Whether the slot still holds a record
    pub fn is_live(&self) -> bool {
        is_live_line(&self.line)
    }

    /// Trimmed payload as text
    pub fn payload(&self) -> String {
        payload_of(&self.line)
    }
}

/// Position and classification of a slot, without its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHeader {
    /// Byte offset of the slot's first byte (the cursor)
    pub offset: u64,

    /// Bytes occupied on disk, terminator included when present
    pub len: u64,

    /// First byte of the line, `None` for an empty line
    pub first: Option<u8>,

    /// Every byte before the terminator is ASCII whitespace
    pub blank: bool,

    /// The slot ends with a terminator (only the last slot may not)
    pub terminated: bool,
}

impl SlotHeader {
    /// Same predicate as [`is_live_line`], from the header alone
    pub fn is_live(&self) -> bool {
        !self.blank && matches!(self.first, Some(b) if b != TOMBSTONE)
    }
}

/// A line is live iff it does not start with the tombstone and holds
/// something other than whitespace
pub fn is_live_line(line: &[u8]) -> bool {
    matches!(line.first(), Some(&b) if b != TOMBSTONE) && !is_blank(line)
}

/// Whether every byte is ASCII whitespace (true for an empty line)
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Strip the terminator and surrounding whitespace, decoding lossily
///
/// Only ASCII whitespace is trimmed, so a live line never yields an empty
/// payload.
pub fn payload_of(line: &[u8]) -> String {
    String::from_utf8_lossy(line)
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_string()
}
