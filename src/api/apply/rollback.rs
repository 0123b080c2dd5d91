use std::io;
use std::path::{Path, PathBuf};

use log::Level;
use serde_json::json;

use crate::api::errors::ErrorId;
use crate::api::Groundwork;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::types::Checkpoint;

/// What guards the target while the apply mutates it.
pub(crate) enum Protection {
    Checkpoint(Checkpoint),
    /// Writes go to `dir`; `renamed` once it has been moved onto the target.
    Staging { dir: PathBuf, renamed: bool },
}

impl Protection {
    pub(crate) fn checkpoint_id(&self) -> Option<String> {
        match self {
            Protection::Checkpoint(c) => Some(c.id.clone()),
            Protection::Staging { .. } => None,
        }
    }
}

/// Undo a failed `WRITE` or `MANIFEST_WRITE`. Returns the errors hit while
/// undoing; empty means the target is back to its pre-apply state.
pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
    slog: &StageLogger<'_>,
    protection: &Protection,
    target: &Path,
) -> Vec<String> {
    let mut errors = Vec::new();
    match protection {
        Protection::Checkpoint(ckpt) => {
            match api.checkpoints().restore(ckpt, target) {
                Ok(()) => {
                    slog.checkpoint_restored()
                        .field("checkpoint_id", json!(ckpt.id))
                        .field("target_directory", json!(target.display().to_string()))
                        .emit_success();
                }
                Err(e) => {
                    errors.push(format!("restore of {} failed: {}", ckpt.id, e.msg));
                    slog.checkpoint_restored()
                        .field("checkpoint_id", json!(ckpt.id))
                        .field("error_message", json!(e.msg))
                        .error_id(ErrorId::E_RESTORE_FAILED)
                        .emit_failure();
                }
            }
        }
        Protection::Staging { dir, renamed } => {
            if let Err(e) = remove_tree(dir) {
                errors.push(format!("remove staging {} failed: {e}", dir.display()));
            }
            if *renamed {
                if let Err(e) = remove_tree(target) {
                    errors.push(format!("remove {} failed: {e}", target.display()));
                }
            }
        }
    }
    if errors.is_empty() {
        api.audit.log(Level::Info, "apply: rolled back");
    } else {
        api.audit
            .log(Level::Error, "apply: rollback incomplete (E_RESTORE_FAILED)");
    }
    errors
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
