//! Recursive directory walking and clearing.
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Kind of a node discovered by [`walk`]. Symlinks are never followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File { mode: u32 },
    Symlink { dest: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Path relative to the walked root, `/`-separated.
    pub rel: String,
    pub kind: NodeKind,
}

/// List every node under `root` (excluding `root` itself), parents before
/// children, siblings in name order. A missing root yields an empty list.
///
/// # Errors
///
/// Returns an IO error on unreadable directories or non-UTF-8 names.
pub fn walk(root: &Path) -> io::Result<Vec<TreeNode>> {
    let mut out = Vec::new();
    match fs::symlink_metadata(root) {
        Ok(md) if md.is_dir() => walk_into(root, "", &mut out)?,
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(out)
}

fn walk_into(dir: &Path, prefix: &str, out: &mut Vec<TreeNode>) -> io::Result<()> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non-UTF-8 entry name under {}", dir.display()),
            ));
        };
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();
        let md = fs::symlink_metadata(&path)?;
        let ft = md.file_type();
        if ft.is_symlink() {
            let dest = fs::read_link(&path)?;
            out.push(TreeNode {
                rel,
                kind: NodeKind::Symlink { dest },
            });
        } else if ft.is_dir() {
            out.push(TreeNode {
                rel: rel.clone(),
                kind: NodeKind::Dir,
            });
            walk_into(&path, &rel, out)?;
        } else {
            out.push(TreeNode {
                rel,
                kind: NodeKind::File {
                    mode: md.permissions().mode() & 0o7777,
                },
            });
        }
    }
    Ok(())
}

/// Delete everything inside `dir`, leaving `dir` itself in place.
/// A missing `dir` is not an error.
///
/// # Errors
///
/// Returns the first IO error encountered while removing entries.
pub fn clear_dir(dir: &Path) -> io::Result<()> {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    for entry in rd {
        let path = entry?.path();
        let md = fs::symlink_metadata(&path)?;
        if md.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Names of the immediate children of `dir` (empty when `dir` is missing).
pub fn child_names(dir: &Path) -> io::Result<Vec<String>> {
    let rd = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    for entry in rd {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
