use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::constants::LOCK_POLL_MS;
use crate::types::errors::{Error, ErrorKind, Result};

use super::{LockGuard, LockManager};

/// Advisory `flock`-style lock on a caller-chosen file. Keep the lock file
/// outside any target directory; an apply whose target contains it is refused.
#[derive(Debug)]
pub struct FileLockManager {
    path: PathBuf,
}

impl FileLockManager {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("create lock dir {}", parent.display()), &e))?;
        }
        // never truncate: the file may be locked by another process
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(format!("open lock {}", self.path.display()), &e))
    }
}

/// Releases the lock on drop.
struct HeldFileLock {
    file: File,
}

impl Drop for HeldFileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl LockGuard for HeldFileLock {}

impl LockManager for FileLockManager {
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let file = self.open()?;
        while file.try_lock_exclusive().is_err() {
            if Instant::now() >= deadline {
                return Err(Error::new(
                    ErrorKind::Policy,
                    format!(
                        "E_LOCKING: {} still held after {timeout_ms}ms",
                        self.path.display()
                    ),
                ));
            }
            thread::sleep(Duration::from_millis(LOCK_POLL_MS));
        }
        Ok(Box::new(HeldFileLock { file }))
    }

    fn backend(&self) -> &'static str {
        "file"
    }

    fn lock_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
