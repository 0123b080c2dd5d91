pub mod file;

use std::path::Path;

use crate::types::errors::Result;

/// Held for as long as the lock should stay taken; dropping it releases the lock.
pub trait LockGuard: Send {}

/// Advisory lock around the mutating stages of an apply
/// (`CHECKPOINT` through `MANIFEST_WRITE`).
pub trait LockManager: Send + Sync {
    /// Acquire the lock, waiting at most `timeout_ms`.
    ///
    /// # Errors
    /// Returns an error if the lock cannot be acquired within the timeout period.
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>>;

    /// Short label recorded in events (`"file"`, `"custom"`).
    fn backend(&self) -> &'static str {
        "custom"
    }

    /// On-disk lock file, when the backend uses one.
    fn lock_path(&self) -> Option<&Path> {
        None
    }
}
