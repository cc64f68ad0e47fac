//! Record format
//!
//! Pure encode/decode functions for log records. Nothing here touches a file:
//! the store hands bytes in and gets bytes out.
//!
//! ## Record Layout
//! ```text
//! ┌───────────────┬──────────────┬────────────────┬─────────┬───────────┐
//! │ Timestamp (4) │ KeyLen (4)   │ ValueLen (4)   │   Key   │   Value   │
//! └───────────────┴──────────────┴────────────────┴─────────┴───────────┘
//!   big-endian u32 fields, no checksum, no magic, no version
//! ```
//!
//! Keys and values are restricted to 7-bit ASCII. Anything else is rejected on
//! both encode and decode.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

/// Header size: Timestamp (4) + KeyLen (4) + ValueLen (4) = 12 bytes
pub const HEADER_SIZE: usize = 12;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Unix seconds at which the record was written
    pub timestamp: u32,
    pub key_size: u32,
    pub value_size: u32,
}

impl Header {
    /// Full size of the record this header describes, header included
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode the 12-byte header
///
/// Fails with `EncodingOverflow` if any field is 2^32 or larger.
pub fn encode_header(timestamp: u64, key_size: usize, value_size: usize) -> Result<[u8; HEADER_SIZE]> {
    let timestamp = to_u32("timestamp", timestamp)?;
    let key_size = to_u32("key_size", key_size as u64)?;
    let value_size = to_u32("value_size", value_size as u64)?;

    let mut header = [0u8; HEADER_SIZE];
    let mut buf = &mut header[..];
    buf.put_u32(timestamp);
    buf.put_u32(key_size);
    buf.put_u32(value_size);

    Ok(header)
}

/// Encode a key-value pair into a record
///
/// Returns the total record size and the record bytes.
pub fn encode_kv(timestamp: u64, key: &str, value: &str) -> Result<(usize, Bytes)> {
    ensure_ascii("key", key.as_bytes())?;
    ensure_ascii("value", value.as_bytes())?;

    let header = encode_header(timestamp, key.len(), value.len())?;

    let size = HEADER_SIZE + key.len() + value.len();
    let mut record = BytesMut::with_capacity(size);
    record.put_slice(&header);
    record.put_slice(key.as_bytes());
    record.put_slice(value.as_bytes());

    Ok((size, record.freeze()))
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a 12-byte header
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> Header {
    let mut buf = &bytes[..];
    Header {
        timestamp: buf.get_u32(),
        key_size: buf.get_u32(),
        value_size: buf.get_u32(),
    }
}

/// Decode a full record into (timestamp, key, value)
///
/// Bytes past the end of the record are ignored.
pub fn decode_kv(data: &[u8]) -> Result<(u32, String, String)> {
    let header_bytes: &[u8; HEADER_SIZE] = data
        .get(..HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or(CaskError::TruncatedRecord {
            expected: HEADER_SIZE,
            actual: data.len(),
        })?;
    let header = decode_header(header_bytes);

    let expected = usize::try_from(header.record_size()).map_err(|_| CaskError::TruncatedRecord {
        expected: usize::MAX,
        actual: data.len(),
    })?;
    if data.len() < expected {
        return Err(CaskError::TruncatedRecord {
            expected,
            actual: data.len(),
        });
    }

    let key_end = HEADER_SIZE + header.key_size as usize;
    let key = decode_text("key", &data[HEADER_SIZE..key_end])?;
    let value = decode_text("value", &data[key_end..expected])?;

    Ok((header.timestamp, key, value))
}

/// Decode value bytes read from the log
pub fn decode_value(bytes: &[u8]) -> Result<String> {
    decode_text("value", bytes)
}

/// Decode key bytes read from the log
pub fn decode_key(bytes: &[u8]) -> Result<String> {
    decode_text("key", bytes)
}

// =============================================================================
// Helpers
// =============================================================================

fn to_u32(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| CaskError::EncodingOverflow { field, value })
}

fn ensure_ascii(field: &str, bytes: &[u8]) -> Result<()> {
    if bytes.is_ascii() {
        Ok(())
    } else {
        Err(CaskError::InvalidEncoding(format!(
            "{} contains non-ASCII bytes",
            field
        )))
    }
}

fn decode_text(field: &str, bytes: &[u8]) -> Result<String> {
    ensure_ascii(field, bytes)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| CaskError::InvalidEncoding(e.to_string()))
}
