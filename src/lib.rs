//! # CaskDB
//!
//! A persistent key-value store built as a log-structured hash table, in the
//! style of the BitCask paper:
//! - Every write is appended to a single log file
//! - An in-memory KeyDir maps each key to the location of its latest value
//! - Reads cost one seek and one read
//! - The KeyDir is rebuilt by scanning the log at startup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DiskStore                             │
//! │               (open / set / get / close)                     │
//! └──────────────┬─────────────────────────────┬────────────────┘
//!                │                             │
//!                ▼                             ▼
//!         ┌─────────────┐              ┌─────────────┐
//!         │   KeyDir    │              │   Format    │
//!         │ (HashMap)   │              │ (encode /   │
//!         └─────────────┘              │  decode)    │
//!                                      └──────┬──────┘
//!                                             │
//!                                             ▼
//!                                      ┌─────────────┐
//!                                      │  Log file   │
//!                                      │ (append)    │
//!                                      └─────────────┘
//! ```
//!
//! ## Limitations
//! No deletes, no compaction, no checksums, single process and single thread.
//!
//! ```no_run
//! use caskdb::DiskStore;
//!
//! let mut store = DiskStore::open("books.db")?;
//! store.set("othello", "shakespeare")?;
//! assert_eq!(store.get("othello")?, "shakespeare");
//! store.close()?;
//! # Ok::<(), caskdb::CaskError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod keydir;
pub mod registry;
pub mod scan;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, RecoveryMode, SyncStrategy};
pub use store::DiskStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CaskDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
