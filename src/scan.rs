//! Startup scan
//!
//! Rebuilds the KeyDir by walking the log from offset 0. Values are skipped,
//! only their location is recorded. A later record for a key replaces the
//! earlier one, so file order decides which value wins.

use std::io::{self, Read};

use tracing::{debug, trace, warn};

use crate::config::RecoveryMode;
use crate::error::{CaskError, Result};
use crate::format::{self, HEADER_SIZE};
use crate::keydir::{FileId, KeyDir, KeyDirEntry};

/// Result of a startup scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Number of complete records read
    pub records_scanned: u64,

    /// Number of distinct keys in the rebuilt KeyDir
    pub keys_indexed: usize,

    /// Length of the log up to the end of the last complete record
    pub valid_length: u64,

    /// Bytes of incomplete trailing record that were dropped
    pub discarded_bytes: u64,

    /// Whether an incomplete trailing record was found and dropped
    pub was_truncated: bool,
}

/// Scan a log of `file_len` bytes starting at the reader's current position
/// (expected to be offset 0).
///
/// In `Strict` mode an incomplete record fails with `CorruptStore`. In
/// `DiscardPartialTail` mode scanning stops at the last complete record and the
/// caller is told how much to drop through `ScanResult`.
pub fn scan_log<R: Read>(
    reader: &mut R,
    file_len: u64,
    file_id: FileId,
    mode: RecoveryMode,
) -> Result<(KeyDir, ScanResult)> {
    let mut key_dir = KeyDir::new();
    let mut result = ScanResult::default();
    let mut position: u64 = 0;

    loop {
        let mut header_bytes = [0u8; HEADER_SIZE];
        let read = read_full(reader, &mut header_bytes)?;
        if read == 0 {
            break;
        }

        let incomplete = if read < HEADER_SIZE {
            Some(format!(
                "expected {} byte header but got {} bytes",
                HEADER_SIZE, read
            ))
        } else {
            None
        };

        let header = format::decode_header(&header_bytes);
        let incomplete = incomplete.or_else(|| {
            let remaining = file_len.saturating_sub(position);
            (header.record_size() > remaining).then(|| {
                format!(
                    "record claims {} bytes but only {} remain",
                    header.record_size(),
                    remaining
                )
            })
        });

        if let Some(reason) = incomplete {
            match mode {
                RecoveryMode::Strict => {
                    return Err(CaskError::CorruptStore {
                        offset: position,
                        reason,
                    });
                }
                RecoveryMode::DiscardPartialTail => {
                    result.discarded_bytes = file_len - position;
                    result.was_truncated = true;
                    warn!(
                        offset = position,
                        discarded = result.discarded_bytes,
                        "Discarding incomplete trailing record: {}",
                        reason
                    );
                    break;
                }
            }
        }

        let mut key_bytes = vec![0u8; header.key_size as usize];
        reader.read_exact(&mut key_bytes)?;
        let key = format::decode_key(&key_bytes).map_err(|e| CaskError::CorruptStore {
            offset: position,
            reason: e.to_string(),
        })?;

        let value_position = position + HEADER_SIZE as u64 + header.key_size as u64;

        // Value bytes are skipped, only their location is kept
        let skipped = io::copy(
            &mut reader.by_ref().take(header.value_size as u64),
            &mut io::sink(),
        )?;
        if skipped != header.value_size as u64 {
            return Err(CaskError::CorruptStore {
                offset: value_position,
                reason: format!(
                    "expected {} value bytes but got {}",
                    header.value_size, skipped
                ),
            });
        }

        trace!(key = %key, offset = position, "Indexed record");
        key_dir.insert(
            key,
            KeyDirEntry {
                file_id,
                value_size: header.value_size,
                value_position,
                timestamp: header.timestamp,
            },
        );

        position += header.record_size();
        result.records_scanned += 1;
    }

    result.valid_length = position;
    result.keys_indexed = key_dir.len();

    debug!(
        records = result.records_scanned,
        keys = result.keys_indexed,
        valid_length = result.valid_length,
        "Scan complete"
    );

    Ok((key_dir, result))
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
/// Unlike `read_exact`, a short read at end of file is reported, not an error.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
