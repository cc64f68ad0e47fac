//! Configuration for CaskDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default log file name, created in the current directory
pub const DEFAULT_FILE_NAME: &str = "data.db";

/// Main configuration for a DiskStore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the log file. A bare file name lands in the current directory.
    pub path: PathBuf,

    /// Sync strategy: whether appends are fsynced or only flushed
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Startup Configuration
    // -------------------------------------------------------------------------
    /// How the startup scan treats an incomplete trailing record
    pub recovery_mode: RecoveryMode,
}

/// Durability of a single `set`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Flush to the OS after every write. Data may be lost on power failure.
    Flush,

    /// fsync after every write (safest, slowest)
    EveryWrite,
}

/// Startup scan behavior for an incomplete record at the end of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Fail the open with `CorruptStore`
    Strict,

    /// Truncate the log back to the last complete record and open normally
    DiscardPartialTail,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE_NAME),
            sync_strategy: SyncStrategy::Flush,
            recovery_mode: RecoveryMode::Strict,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the recovery mode used by the startup scan
    pub fn recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.config.recovery_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
