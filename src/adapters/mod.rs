pub mod lock;
pub mod writer;

pub use lock::file::FileLockManager;
pub use lock::{LockGuard, LockManager};
pub use writer::{FileWriter, FsWriter};
