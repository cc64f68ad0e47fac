//! Open-path registry
//!
//! Tracks which log files are held by a live store in this process. Two stores
//! appending to the same file would corrupt each other's index, so a second
//! open of a held path is refused. Other processes are not covered.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::{const_mutex, Mutex};

use crate::error::{CaskError, Result};

static OPEN_PATHS: Mutex<BTreeSet<PathBuf>> = const_mutex(BTreeSet::new());

/// Reservation of a log path, released on drop
#[derive(Debug)]
pub struct PathGuard {
    path: PathBuf,
}

impl PathGuard {
    /// Reserve `path`. The caller should pass a canonical path so that
    /// different spellings of the same file collide.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut open = OPEN_PATHS.lock();
        if !open.insert(path.to_path_buf()) {
            return Err(CaskError::AlreadyOpen(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        OPEN_PATHS.lock().remove(&self.path);
    }
}

/// Whether `path` is currently held by a live store
pub fn is_held(path: &Path) -> bool {
    OPEN_PATHS.lock().contains(path)
}
