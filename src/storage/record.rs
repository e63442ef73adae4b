//! Table log record format
//!
//! One record per line:
//!
//! ```text
//! <crc32 as 8 lowercase hex digits> <json body>\n
//! ```
//!
//! The body is `{"op":"put","id":..,"doc":{..}}` for a full-document write
//! or `{"op":"delete","id":..}` for a tombstone. Records are never rewritten
//! in place; the latest record for an id wins.

use serde::{Deserialize, Serialize};

use super::backend::Document;
use super::checksum::{compute_checksum, verify_checksum};
use super::errors::StoreResult;

const CHECKSUM_HEX_LEN: usize = 8;

/// A single entry in a table log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum LogRecord {
    /// Full document image after an insert or update
    Put { id: String, doc: Document },
    /// Tombstone
    Delete { id: String },
}

impl LogRecord {
    pub fn id(&self) -> &str {
        match self {
            LogRecord::Put { id, .. } | LogRecord::Delete { id } => id,
        }
    }

    /// Encodes the record as a newline-terminated log line.
    pub fn encode(&self) -> StoreResult<String> {
        let body = serde_json::to_string(self)?;
        let checksum = compute_checksum(body.as_bytes());
        Ok(format!("{:08x} {}\n", checksum, body))
    }

    /// Decodes a log line (without its trailing newline).
    ///
    /// Returns the reason on failure so the caller can attach the file
    /// position.
    pub fn decode(line: &str) -> Result<Self, String> {
        let (checksum_hex, body) = line
            .split_once(' ')
            .ok_or_else(|| "missing checksum separator".to_string())?;

        if checksum_hex.len() != CHECKSUM_HEX_LEN {
            return Err(format!("malformed checksum '{}'", checksum_hex));
        }
        let expected = u32::from_str_radix(checksum_hex, 16)
            .map_err(|_| format!("malformed checksum '{}'", checksum_hex))?;

        if !verify_checksum(body.as_bytes(), expected) {
            return Err("checksum mismatch".to_string());
        }

        serde_json::from_str(body).map_err(|e| format!("invalid record body: {}", e))
    }
}
