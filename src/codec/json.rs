//! JSON line codec
//!
//! Compact `serde_json` output never contains a raw newline: newlines inside
//! strings are escaped as `\n`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FifoLogError, Result};

use super::RecordCodec;

/// Default codec: one compact JSON document per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineCodec;

impl RecordCodec for JsonLineCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| FifoLogError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, line: &str) -> Result<T> {
        serde_json::from_str(line).map_err(|e| FifoLogError::Decode(e.to_string()))
    }
}
