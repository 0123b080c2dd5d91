use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::constants::{CHECKPOINT_ID_PREFIX, DOC_EXT, DOC_SCHEMA_VERSION, REGULAR_MODE};
use crate::fs::{fsync_parent_dir, kind_of, walk, write_file_atomic, NodeKind};
use crate::logging::now_iso;
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::ids::new_checkpoint_id;
use crate::types::{Checkpoint, CheckpointEntry, ContentEncoding, PlanPath, PruneResult, SafeId};

/// Checkpoint documents kept in a single caller-designated directory.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    durable: bool,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, durable: bool) -> Self {
        Self {
            dir: dir.into(),
            durable,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the document for `id`. Rejects ids that are not a plain file name.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let id = SafeId::parse(id)?;
        Ok(self.dir.join(format!("{id}.{DOC_EXT}")))
    }

    /// Capture the current state of `target` and persist it.
    ///
    /// A missing target yields a checkpoint with no entries and
    /// `target_existed = false`.
    ///
    /// # Errors
    ///
    /// Fails when `target` is not a directory, when any node cannot be read,
    /// or when the document cannot be written.
    pub fn snapshot(&self, scaffold_id: &str, target: &Path) -> Result<Checkpoint> {
        let target_existed = match kind_of(target) {
            "missing" => false,
            "dir" => true,
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidPath,
                    format!("cannot checkpoint {}: it is a {other}", target.display()),
                ))
            }
        };
        let nodes = walk(target).map_err(|e| Error::io(format!("walk {}", target.display()), &e))?;
        let mut entries = Vec::with_capacity(nodes.len());
        for node in nodes {
            let abs = target.join(&node.rel);
            entries.push(match node.kind {
                NodeKind::Dir => CheckpointEntry::Dir { path: node.rel },
                NodeKind::File { mode } => {
                    let bytes =
                        fs::read(&abs).map_err(|e| Error::io(format!("read {}", abs.display()), &e))?;
                    let (content, encoding) = match String::from_utf8(bytes) {
                        Ok(s) => (s, ContentEncoding::Utf8),
                        Err(e) => (B64.encode(e.into_bytes()), ContentEncoding::Base64),
                    };
                    CheckpointEntry::File {
                        path: node.rel,
                        content,
                        encoding,
                        mode: Some(mode),
                    }
                }
                NodeKind::Symlink { dest } => CheckpointEntry::Symlink {
                    path: node.rel,
                    dest: dest.to_string_lossy().into_owned(),
                },
            });
        }
        let ckpt = Checkpoint {
            schema_version: DOC_SCHEMA_VERSION,
            id: new_checkpoint_id(),
            created_at: now_iso(),
            scaffold_id: Some(scaffold_id.to_string()),
            target_directory: target.to_path_buf(),
            target_existed,
            entries,
        };
        self.persist(&ckpt)?;
        Ok(ckpt)
    }

    fn persist(&self, ckpt: &Checkpoint) -> Result<()> {
        let path = self.path_for(&ckpt.id)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io(format!("create {}", self.dir.display()), &e))?;
        let doc = serde_json::to_vec_pretty(ckpt)?;
        write_file_atomic(&path, &doc, REGULAR_MODE, self.durable)
            .map_err(|e| Error::io(format!("write {}", path.display()), &e))
    }

    /// # Errors
    ///
    /// `NotFound` when no document exists for `id`; `Serialize` when it is malformed.
    pub fn load(&self, id: &str) -> Result<Checkpoint> {
        let path = self.path_for(id)?;
        let raw = fs::read(&path).map_err(|e| Error::io(format!("read {}", path.display()), &e))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Every readable checkpoint in the store, oldest first. Unparseable
    /// documents are skipped.
    pub fn list(&self) -> Result<Vec<Checkpoint>> {
        let rd = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(format!("list {}", self.dir.display()), &e)),
        };
        let suffix = format!(".{DOC_EXT}");
        let mut out: Vec<Checkpoint> = Vec::new();
        for entry in rd.flatten() {
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .filter(|n| n.starts_with(CHECKPOINT_ID_PREFIX))
                .and_then(|n| n.strip_suffix(&suffix))
            else {
                continue;
            };
            if let Ok(ckpt) = self.load(id) {
                out.push(ckpt);
            }
        }
        out.sort_by(|a, b| {
            created_key(&a.created_at)
                .cmp(&created_key(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    /// Delete the document for `id`. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                if self.durable {
                    let _ = fsync_parent_dir(&path);
                }
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(format!("remove {}", path.display()), &e)),
        }
    }

    /// Keep at most `count_limit` newest checkpoints. The newest one is never
    /// deleted, so the limit is clamped to at least 1. `None` prunes nothing.
    pub fn prune(&self, count_limit: Option<usize>) -> Result<PruneResult> {
        let mut all = self.list()?;
        all.reverse();
        let keep = count_limit.map_or(usize::MAX, |n| n.max(1));
        let mut result = PruneResult::default();
        for (idx, ckpt) in all.iter().enumerate() {
            if idx < keep {
                result.retained_count += 1;
                continue;
            }
            // best-effort: a checkpoint that cannot be removed is still retained
            if self.remove(&ckpt.id).unwrap_or(false) {
                result.pruned_count += 1;
            } else {
                result.retained_count += 1;
            }
        }
        Ok(result)
    }

    /// Put `target` back into the state captured by `ckpt`.
    ///
    /// Everything currently under `target` is deleted first. A checkpoint of
    /// an absent target removes `target` itself and stops there.
    ///
    /// # Errors
    ///
    /// Returns the first deletion or recreation error; the target may then be
    /// partially restored.
    pub fn restore(&self, ckpt: &Checkpoint, target: &Path) -> Result<()> {
        remove_node(target).map_err(|e| Error::io(format!("clear {}", target.display()), &e))?;
        if !ckpt.target_existed {
            return Ok(());
        }
        fs::create_dir_all(target)
            .map_err(|e| Error::io(format!("recreate {}", target.display()), &e))?;

        for entry in &ckpt.entries {
            let rel = PlanPath::parse(entry.path())?;
            let abs = rel.under(target);
            match entry {
                CheckpointEntry::Dir { .. } => fs::create_dir_all(&abs)
                    .map_err(|e| Error::io(format!("mkdir {}", abs.display()), &e))?,
                CheckpointEntry::File {
                    content,
                    encoding,
                    mode,
                    ..
                } => {
                    let bytes = match encoding {
                        ContentEncoding::Utf8 => content.as_bytes().to_vec(),
                        ContentEncoding::Base64 => B64.decode(content).map_err(|e| {
                            Error::new(
                                ErrorKind::Serialize,
                                format!("checkpoint {} entry {rel}: {e}", ckpt.id),
                            )
                        })?,
                    };
                    if let Some(parent) = abs.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|e| Error::io(format!("mkdir {}", parent.display()), &e))?;
                    }
                    write_file_atomic(&abs, &bytes, mode.unwrap_or(REGULAR_MODE), self.durable)
                        .map_err(|e| Error::io(format!("restore {}", abs.display()), &e))?;
                }
                CheckpointEntry::Symlink { dest, .. } => {
                    std::os::unix::fs::symlink(dest, &abs)
                        .map_err(|e| Error::io(format!("symlink {}", abs.display()), &e))?;
                }
            }
        }
        Ok(())
    }

    /// Load `id` and restore it onto `target`.
    pub fn restore_by_id(&self, id: &str, target: &Path) -> Result<Checkpoint> {
        let ckpt = self.load(id)?;
        self.restore(&ckpt, target)?;
        Ok(ckpt)
    }
}

fn created_key(created_at: &str) -> OffsetDateTime {
    OffsetDateTime::parse(created_at, &Rfc3339).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Remove whatever is at `path`; a missing path is fine.
fn remove_node(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
