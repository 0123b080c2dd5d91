//! Atomic file publication primitives.
//!
//! Writes follow a TOCTOU-safe sequence using directory handles:
//! `open_dir_nofollow(parent) -> openat(tmp, O_EXCL) -> write -> renameat(tmp, final) -> fsync(dirfd)`.
//! A reader never observes a partially written file at the final name.
use std::ffi::CString;
use std::fs;
use std::io::Write as _;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::TMP_SUFFIX;
use rustix::fd::OwnedFd;
use rustix::fs::{fchmod, openat, renameat, unlinkat, AtFlags, Mode, OFlags, CWD};
use rustix::io::Errno;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

// Global counter to produce unique temporary names within a process.
static NEXT_TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn cstring(bytes: &[u8]) -> std::io::Result<CString> {
    CString::new(bytes)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid cstring"))
}

/// Open a directory with `O_DIRECTORY` | `O_NOFOLLOW` for atomic operations.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be opened.
pub fn open_dir_nofollow(dir: &Path) -> std::io::Result<OwnedFd> {
    let c = cstring(dir.as_os_str().as_bytes())?;
    openat(
        CWD,
        c.as_c_str(),
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::empty(),
    )
    .map_err(errno_to_io)
}

/// Fsync the parent directory of `path` for durability.
///
/// # Errors
///
/// Returns an IO error if the parent directory cannot be opened or fsynced.
pub fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        let dir = fs::File::open(parent)?;
        dir.sync_all()?;
    }
    Ok(())
}

/// Fsync a directory using an already-open directory file descriptor.
fn fsync_dirfd(dirfd: &OwnedFd) -> std::io::Result<()> {
    rustix::fs::fsync(dirfd).map_err(errno_to_io)
}

fn tmp_name_for(fname: &std::ffi::OsStr) -> String {
    let pid = std::process::id();
    let ctr = NEXT_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{}.{pid}.{ctr}{TMP_SUFFIX}", fname.to_string_lossy())
}

/// Write `bytes` to `target` atomically with permission `mode`.
///
/// The parent directory must already exist. Any previous file at `target`
/// is replaced in a single rename. On error the temporary file is removed.
///
/// # Errors
///
/// Returns an IO error if any step of the write/rename sequence fails.
pub fn write_file_atomic(target: &Path, bytes: &[u8], mode: u32, durable: bool) -> std::io::Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let fname = target.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name")
    })?;
    let dirfd = open_dir_nofollow(parent)?;
    let tmp_c = cstring(tmp_name_for(fname).as_bytes())?;
    let new_c = cstring(fname.as_bytes())?;

    let fd = openat(
        &dirfd,
        tmp_c.as_c_str(),
        OFlags::WRONLY | OFlags::CREATE | OFlags::EXCL | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::from_bits_truncate(mode),
    )
    .map_err(errno_to_io)?;
    let mut file = fs::File::from(fd);
    let written = file
        .write_all(bytes)
        // umask may have narrowed the create mode
        .and_then(|()| fchmod(&file, Mode::from_bits_truncate(mode)).map_err(errno_to_io))
        .and_then(|()| if durable { file.sync_all() } else { Ok(()) });
    drop(file);
    if let Err(e) = written {
        let _ = unlinkat(&dirfd, tmp_c.as_c_str(), AtFlags::empty());
        return Err(e);
    }

    if let Err(e) = renameat(&dirfd, tmp_c.as_c_str(), &dirfd, new_c.as_c_str()) {
        let _ = unlinkat(&dirfd, tmp_c.as_c_str(), AtFlags::empty());
        return Err(errno_to_io(e));
    }
    if durable {
        fsync_dirfd(&dirfd)?;
    }
    Ok(())
}

/// Publish `bytes` at `target` only if nothing exists there yet.
///
/// The content is staged in a temporary file and hard-linked into place, so
/// two racing writers cannot both succeed and readers never see partial data.
///
/// # Errors
///
/// Returns `AlreadyExists` when `target` is already present, or any IO error
/// from staging.
pub fn publish_new(target: &Path, bytes: &[u8], durable: bool) -> std::io::Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let fname = target.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name")
    })?;
    let staged = parent.join(tmp_name_for(fname));
    write_file_atomic(&staged, bytes, 0o644, durable)?;
    let linked = fs::hard_link(&staged, target);
    let _ = fs::remove_file(&staged);
    linked?;
    if durable {
        let _ = fsync_parent_dir(target);
    }
    Ok(())
}
