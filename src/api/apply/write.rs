use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::adapters::FileWriter;
use crate::constants::{EXECUTABLE_MODE, REGULAR_MODE, STAGING_INFIX};
use crate::fs::{canonicalize_existing_prefix, node_exists};
use crate::types::{FailedStage, PlanPath, PlannedFile};

use super::gating::WriteMode;

#[derive(Debug)]
pub(crate) struct WriteFailure {
    pub stage: FailedStage,
    pub path: String,
    pub msg: String,
}

/// Split plan files into those to write and those to skip. Only
/// `merge_safe_only` skips anything: files already present are left untouched.
pub(crate) fn partition<'p>(
    target: &Path,
    files: &'p [PlannedFile],
    mode: WriteMode,
) -> (Vec<&'p PlannedFile>, Vec<String>) {
    if mode != WriteMode::MergeSafeOnly {
        return (files.iter().collect(), Vec::new());
    }
    let mut create = Vec::new();
    let mut skip = Vec::new();
    for f in files {
        if node_exists(&f.path.under(target)) {
            skip.push(f.path.to_string());
        } else {
            create.push(f);
        }
    }
    (create, skip)
}

pub(crate) const fn mode_for(f: &PlannedFile) -> u32 {
    if f.executable {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    }
}

/// Sibling directory the `temp_staging` strategy writes into before renaming
/// it onto `target`.
pub(crate) fn staging_dir_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "scaffold".to_string(), |n| n.to_string_lossy().into_owned());
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{name}{STAGING_INFIX}{}", Uuid::new_v4().simple()))
}

/// Refuse `rel` when the existing part of `abs` resolves outside `real_root`.
fn confine(
    real_root: &Path,
    abs: &Path,
    rel: &PlanPath,
    stage: FailedStage,
) -> Result<(), WriteFailure> {
    let refuse = |msg: String| WriteFailure {
        stage,
        path: rel.to_string(),
        msg,
    };
    match canonicalize_existing_prefix(abs) {
        Ok(real) if real.starts_with(real_root) => Ok(()),
        Ok(real) => Err(refuse(format!(
            "{rel} resolves to {} outside {}",
            real.display(),
            real_root.display()
        ))),
        Err(e) => Err(refuse(format!("resolve {}: {e}", abs.display()))),
    }
}

/// Create `root` and every directory, then write every file, in plan order.
/// Stops at the first failure and reports the stage and plan path it hit.
/// Nothing is created or written through a symlink that leaves `root`.
pub(crate) fn materialize(
    writer: &dyn FileWriter,
    root: &Path,
    dirs: &[PlanPath],
    files: &[&PlannedFile],
    durable: bool,
) -> Result<(), WriteFailure> {
    let root_failure = |msg: String| WriteFailure {
        stage: FailedStage::Mkdir,
        path: root.display().to_string(),
        msg,
    };
    writer
        .create_dir_all(root)
        .map_err(|e| root_failure(e.msg))?;
    let real_root = canonicalize_existing_prefix(root)
        .map_err(|e| root_failure(format!("resolve {}: {e}", root.display())))?;
    for d in dirs {
        confine(&real_root, &d.under(root), d, FailedStage::Mkdir)?;
        writer
            .create_dir_all(&d.under(root))
            .map_err(|e| WriteFailure {
                stage: FailedStage::Mkdir,
                path: d.to_string(),
                msg: e.msg,
            })?;
    }
    for f in files {
        let abs = f.path.under(root);
        if let Some(parent) = abs.parent() {
            confine(&real_root, parent, &f.path, FailedStage::Write)?;
        }
        writer
            .write_file(&f.path.under(root), f.content.as_bytes(), mode_for(f), durable)
            .map_err(|e| WriteFailure {
                stage: FailedStage::Write,
                path: f.path.to_string(),
                msg: e.msg,
            })?;
    }
    Ok(())
}
