//! Bincode line codec
//!
//! Compact binary records for devices where JSON is too verbose. The bincode
//! bytes are wrapped in standard base64, whose alphabet contains neither the
//! terminator nor the tombstone byte.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FifoLogError, Result};

use super::RecordCodec;

/// Binary codec: base64(bincode(value)) per line
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeLineCodec;

impl RecordCodec for BincodeLineCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let bytes = bincode::serialize(value).map_err(|e| FifoLogError::Encode(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }

    fn decode<T: DeserializeOwned>(&self, line: &str) -> Result<T> {
        let bytes = STANDARD
            .decode(line)
            .map_err(|e| FifoLogError::Decode(e.to_string()))?;
        bincode::deserialize(&bytes).map_err(|e| FifoLogError::Decode(e.to_string()))
    }
}
