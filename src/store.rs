//! Store Module
//!
//! The disk-backed store that ties the log file, the KeyDir and the record
//! format together.
//!
//! ## Responsibilities
//! - Open (or create) the log and rebuild the KeyDir with a startup scan
//! - Append records for `set` and point the KeyDir at the new value
//! - Serve `get` with one seek and one read
//! - Release both file handles on close
//!
//! ## Lifecycle
//! ```text
//! Closed ──open()──▶ Scanning ──▶ Ready ──close()──▶ Closed
//!                       │
//!                       └── corrupt log ──▶ error (handles released)
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

use crate::config::{Config, SyncStrategy};
use crate::error::{CaskError, Result};
use crate::format;
use crate::keydir::{FileId, KeyDir, KeyDirEntry};
use crate::registry::PathGuard;
use crate::scan::{self, ScanResult};

/// File id of the single active log
pub const ACTIVE_FILE_ID: FileId = 0;

/// Open handles of a Ready store
struct StoreFiles {
    /// Read handle, seeked for every `get`
    reader: BufReader<File>,
    /// Append-only write handle
    writer: File,
}

/// Log-structured hash table on a single file
///
/// ## Concurrency Model
///
/// None. Every method does blocking I/O and mutating methods take `&mut self`.
/// Only one store may hold a given path within a process (enforced by the
/// open-path registry); sharing a file across processes corrupts it.
pub struct DiskStore {
    config: Config,

    /// Canonical path of the log file
    path: PathBuf,

    /// `None` once closed
    files: Option<StoreFiles>,

    key_dir: KeyDir,

    /// Current length of the log
    write_position: u64,

    scan_result: ScanResult,

    /// Reservation in the open-path registry
    guard: Option<PathGuard>,
}

impl DiskStore {
    /// Open or create a store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(Config::builder().path(path.as_ref()).build())
    }

    /// Open or create a store at the default file name in the current directory
    pub fn open_default() -> Result<Self> {
        Self::open_with_config(Config::default())
    }

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the file if missing and open the append handle
    /// 2. Reserve the canonical path
    /// 3. Open the read handle and scan the whole log into the KeyDir
    /// 4. Drop an incomplete tail if the recovery mode allows it
    ///
    /// Any failure drops the handles opened so far and the path reservation.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        let path = fs::canonicalize(&config.path)?;
        let guard = PathGuard::acquire(&path)?;

        let read_file = File::open(&path)?;
        let file_len = read_file.metadata()?.len();
        let mut reader = BufReader::new(read_file);

        debug!(path = %path.display(), bytes = file_len, "Scanning log");
        let (key_dir, scan_result) =
            scan::scan_log(&mut reader, file_len, ACTIVE_FILE_ID, config.recovery_mode)?;

        if scan_result.was_truncated {
            writer.set_len(scan_result.valid_length)?;
            writer.sync_all()?;
        }

        info!(
            path = %path.display(),
            records = scan_result.records_scanned,
            keys = scan_result.keys_indexed,
            truncated = scan_result.was_truncated,
            "Store opened"
        );

        Ok(Self {
            write_position: scan_result.valid_length,
            config,
            path,
            files: Some(StoreFiles { reader, writer }),
            key_dir,
            scan_result,
            guard: Some(guard),
        })
    }

    /// Set a key to a value, timestamped with the current wall-clock second
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_at(key, value, unix_now())
    }

    /// Set a key to a value with an explicit timestamp (unix seconds)
    ///
    /// The record is encoded before anything is written, so encoding errors
    /// leave both the file and the KeyDir untouched.
    pub fn set_at(&mut self, key: &str, value: &str, timestamp: u64) -> Result<()> {
        let files = self.files.as_mut().ok_or(CaskError::StoreClosed)?;
        let (size, record) = format::encode_kv(timestamp, key, value)?;

        let end = match Self::append(&mut files.writer, &record, self.config.sync_strategy) {
            Ok(end) => end,
            Err(e) => return Err(self.abort_append(e)),
        };

        // Value is the tail of the record just written
        self.write_position = end;
        let value_position = end - value.len() as u64;

        let previous = self.key_dir.insert(
            key.to_string(),
            KeyDirEntry {
                file_id: ACTIVE_FILE_ID,
                value_size: value.len() as u32,
                value_position,
                timestamp: timestamp as u32,
            },
        );

        debug!(key, bytes = size, overwrite = previous.is_some(), "Appended record");
        Ok(())
    }

    /// Write one record and return the new end of the log
    fn append(writer: &mut File, record: &[u8], sync_strategy: SyncStrategy) -> io::Result<u64> {
        writer.write_all(record)?;
        writer.flush()?;
        if sync_strategy == SyncStrategy::EveryWrite {
            writer.sync_data()?;
        }
        writer.stream_position()
    }

    /// Cut the log back to the last acknowledged record after a failed append.
    ///
    /// A record that is partly (or fully but unsynced) on disk is never indexed,
    /// so it must not stay in front of later appends. If the truncation fails
    /// too, the store is closed and later calls fail with `StoreClosed`.
    fn abort_append(&mut self, err: io::Error) -> CaskError {
        let restored = match self.files.as_mut() {
            Some(files) => files.writer.set_len(self.write_position),
            None => return CaskError::Io(err),
        };

        match restored {
            Ok(()) => {
                warn!(
                    length = self.write_position,
                    "Append failed, log restored to last complete record: {}",
                    err
                );
            }
            Err(restore_err) => {
                error!(
                    path = %self.path.display(),
                    "Append failed and log could not be restored ({}), closing store: {}",
                    restore_err,
                    err
                );
                self.files = None;
                self.guard = None;
            }
        }

        CaskError::Io(err)
    }

    /// Get the value for a key, or an empty string if the key is unknown
    ///
    /// Use [`DiskStore::find`] to tell a missing key from an empty value.
    pub fn get(&mut self, key: &str) -> Result<String> {
        Ok(self.find(key)?.unwrap_or_default())
    }

    /// Get the value for a key
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found
    /// - `Ok(None)` — key never set
    pub fn find(&mut self, key: &str) -> Result<Option<String>> {
        let files = self.files.as_mut().ok_or(CaskError::StoreClosed)?;
        let entry = match self.key_dir.get(key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };

        files.reader.seek(SeekFrom::Start(entry.value_position))?;
        let mut value = vec![0u8; entry.value_size as usize];
        files.reader.read_exact(&mut value)?;

        format::decode_value(&value).map(Some)
    }

    /// Flush and close both handles
    ///
    /// Later operations fail with `StoreClosed`. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut files) = self.files.take() else {
            return Ok(());
        };

        let flushed = Self::flush_writer(&mut files.writer, self.config.sync_strategy);

        // Handles and reservation go away even if the flush failed
        drop(files);
        self.guard = None;

        info!(path = %self.path.display(), keys = self.key_dir.len(), "Store closed");
        flushed
    }

    fn flush_writer(writer: &mut File, sync_strategy: SyncStrategy) -> Result<()> {
        writer.flush()?;
        if sync_strategy == SyncStrategy::EveryWrite {
            writer.sync_all()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Canonical path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store accepts operations
    pub fn is_open(&self) -> bool {
        self.files.is_some()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.key_dir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_dir.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_dir.contains_key(key)
    }

    /// Indexed keys, in arbitrary order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.key_dir.keys()
    }

    /// KeyDir entry for a key
    pub fn entry(&self, key: &str) -> Option<&KeyDirEntry> {
        self.key_dir.get(key)
    }

    /// Current length of the log in bytes
    pub fn file_size(&self) -> u64 {
        self.write_position
    }

    /// Statistics of the startup scan
    pub fn scan_result(&self) -> &ScanResult {
        &self.scan_result
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for DiskStore {
    fn drop(&mut self) {
        if let Some(files) = self.files.as_mut() {
            let _ = Self::flush_writer(&mut files.writer, self.config.sync_strategy);
        }
    }
}

impl std::fmt::Debug for DiskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskStore")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("keys", &self.key_dir.len())
            .field("file_size", &self.write_position)
            .finish()
    }
}

/// Current wall-clock time in unix seconds (0 if the clock is before the epoch)
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
