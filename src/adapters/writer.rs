use std::path::Path;

use crate::fs::atomic::write_file_atomic;
use crate::types::errors::{Error, Result};

/// Port through which the `WRITE` stage touches the filesystem.
///
/// The default [`FsWriter`] creates directories with `create_dir_all` and
/// publishes files atomically; alternative implementations exist mainly to
/// inject failures at a precise point of a plan.
pub trait FileWriter: Send + Sync {
    /// Create a directory and any missing parents. Existing directories are a no-op.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write `content` to `path` with permission `mode`; the parent exists.
    fn write_file(&self, path: &Path, content: &[u8], mode: u32, durable: bool) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FsWriter;

impl FileWriter for FsWriter {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| Error::io(format!("mkdir {}", path.display()), &e))
    }

    fn write_file(&self, path: &Path, content: &[u8], mode: u32, durable: bool) -> Result<()> {
        write_file_atomic(path, content, mode, durable)
            .map_err(|e| Error::io(format!("write {}", path.display()), &e))
    }
}
