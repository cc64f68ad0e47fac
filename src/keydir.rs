//! KeyDir
//!
//! In-memory index mapping each key to the location of its latest value in the
//! log. Values themselves are never held here.

use std::collections::HashMap;

/// Identifies the log file an entry points into
pub type FileId = u32;

/// Location of a key's most recent value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDirEntry {
    /// Log file holding the value
    pub file_id: FileId,
    /// Length of the value in bytes
    pub value_size: u32,
    /// Byte offset where the value starts
    pub value_position: u64,
    /// Timestamp of the write that produced the value
    pub timestamp: u32,
}

impl KeyDirEntry {
    /// Offset one past the last value byte
    pub fn value_end(&self) -> u64 {
        self.value_position + self.value_size as u64
    }
}

/// Key → location index
#[derive(Debug, Default)]
pub struct KeyDir {
    entries: HashMap<String, KeyDirEntry>,
}

impl KeyDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&KeyDirEntry> {
        self.entries.get(key)
    }

    /// Insert or replace the entry for `key`, returning the previous one
    pub fn insert(&mut self, key: String, entry: KeyDirEntry) -> Option<KeyDirEntry> {
        self.entries.insert(key, entry)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over indexed keys (arbitrary order)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
