//! Codec Module
//!
//! Turns structured values into single-line records and back.
//!
//! ## Contract
//! - `encode` yields one line with no embedded terminator
//! - `decode` reports failure explicitly, never a default value
//!
//! The store double-checks the first rule before appending, so a codec that
//! breaks it is rejected with a validation error instead of corrupting slots.

mod binary;
mod json;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub use self::binary::BincodeLineCodec;
pub use self::json::JsonLineCodec;

/// Encodes values to single-line records
pub trait RecordCodec {
    /// Encode a value as one line without a terminator
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    /// Decode a trimmed record payload
    fn decode<T: DeserializeOwned>(&self, line: &str) -> Result<T>;
}
