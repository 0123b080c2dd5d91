//! Individual conflict probes. Each returns zero or more records and never
//! mutates the filesystem.
use std::path::{Path, PathBuf};

use crate::fs::{canonicalize_existing_prefix, child_names, is_within, kind_of, node_exists};
use crate::policy::types::Conflicts;
use crate::types::{ConflictReason, ConflictRecord, PlanPath, PlannedFile, ValidatedPlan};

/// Containment of `target` in `workspace`: lexical first, then with symlinks
/// resolved on the existing part of both paths.
pub fn check_containment(workspace: &Path, target: &Path) -> Option<ConflictRecord> {
    let outside = |why: String| ConflictRecord {
        path: target.display().to_string(),
        reason: ConflictReason::OutsideWorkspace,
        description: why,
    };
    if !is_within(workspace, target) {
        return Some(outside(format!(
            "Target '{}' is not inside workspace '{}'",
            target.display(),
            workspace.display()
        )));
    }
    match (
        canonicalize_existing_prefix(workspace),
        canonicalize_existing_prefix(target),
    ) {
        (Ok(ws), Ok(t)) if t.starts_with(&ws) => None,
        (Ok(ws), Ok(t)) => Some(outside(format!(
            "Target '{}' resolves to '{}' outside workspace '{}'",
            target.display(),
            t.display(),
            ws.display()
        ))),
        (Err(e), _) | (_, Err(e)) => Some(outside(format!(
            "Cannot resolve '{}' against workspace: {e}",
            target.display()
        ))),
    }
}

/// Plan directories (declared or implied by a file) whose existing part
/// under `target` resolves through a symlink to somewhere outside the
/// workspace. Only the outermost offending directory is reported.
pub fn check_plan_containment(
    workspace: &Path,
    target: &Path,
    plan: &ValidatedPlan,
) -> Vec<ConflictRecord> {
    let ws = match canonicalize_existing_prefix(workspace) {
        Ok(ws) => ws,
        Err(e) => {
            return vec![ConflictRecord {
                path: workspace.display().to_string(),
                reason: ConflictReason::OutsideWorkspace,
                description: format!("Cannot resolve workspace '{}': {e}", workspace.display()),
            }]
        }
    };
    let mut flagged: Vec<PlanPath> = Vec::new();
    let mut out = Vec::new();
    for d in plan.all_dirs() {
        if d.ancestors().iter().any(|a| flagged.contains(a)) {
            continue;
        }
        let abs = d.under(target);
        let why = match canonicalize_existing_prefix(&abs) {
            Ok(real) if real.starts_with(&ws) => continue,
            Ok(real) => format!(
                "Plan directory '{d}' resolves to '{}' outside workspace '{}'",
                real.display(),
                ws.display()
            ),
            Err(e) => format!("Plan directory '{d}' cannot be resolved: {e}"),
        };
        out.push(ConflictRecord {
            path: d.to_string(),
            reason: ConflictReason::OutsideWorkspace,
            description: why,
        });
        flagged.push(d);
    }
    out
}

/// The target itself: a non-directory node in its place, or a directory
/// holding anything beyond the harmless allowlist.
pub fn check_target_state(policy: &Conflicts, target: &Path) -> Option<ConflictRecord> {
    match kind_of(target) {
        "missing" => None,
        "dir" => match child_names(target) {
            Ok(names) => {
                let blocking: Vec<String> = names
                    .into_iter()
                    .filter(|n| !policy.is_harmless(n))
                    .collect();
                if blocking.is_empty() {
                    return None;
                }
                let shown: Vec<&str> = blocking.iter().take(5).map(String::as_str).collect();
                let more = if blocking.len() > shown.len() {
                    format!(" (+{} more)", blocking.len() - shown.len())
                } else {
                    String::new()
                };
                Some(ConflictRecord {
                    path: target.display().to_string(),
                    reason: ConflictReason::DirNotEmpty,
                    description: format!(
                        "Directory '{}' already contains {} entr{}: {}{more}",
                        target.display(),
                        blocking.len(),
                        if blocking.len() == 1 { "y" } else { "ies" },
                        shown.join(", ")
                    ),
                })
            }
            Err(e) => Some(ConflictRecord {
                path: target.display().to_string(),
                reason: ConflictReason::DirNotEmpty,
                description: format!("Directory '{}' cannot be listed: {e}", target.display()),
            }),
        },
        other => Some(ConflictRecord {
            path: target.display().to_string(),
            reason: ConflictReason::Exists,
            description: format!(
                "Target '{}' exists and is a {other}, not a directory",
                target.display()
            ),
        }),
    }
}

/// One `exists` record per plan file already present under `target`.
pub fn check_existing_files(target: &Path, files: &[PlannedFile]) -> Vec<ConflictRecord> {
    files
        .iter()
        .filter_map(|f| {
            let abs = f.path.under(target);
            if !node_exists(&abs) {
                return None;
            }
            Some(ConflictRecord {
                path: f.path.to_string(),
                reason: ConflictReason::Exists,
                description: format!("'{}' already exists ({})", f.path, kind_of(&abs)),
            })
        })
        .collect()
}

/// Propose a fresh directory for `choose_new_dir`: `<target>-2`, `<target>-3`, ...
/// inside the workspace. When the target is outside the workspace the probe
/// starts from `<workspace>/<target name>`.
pub fn suggest_new_dir(workspace: &Path, target: &Path, outside: bool, max_probes: u32) -> Option<PathBuf> {
    let name = target
        .file_name()
        .map_or_else(|| "scaffold".to_string(), |n| n.to_string_lossy().into_owned());
    let base = if outside {
        workspace.join(&name)
    } else {
        target.to_path_buf()
    };
    if outside && !node_exists(&base) {
        return Some(base);
    }
    let parent = base.parent().unwrap_or(workspace);
    (2..max_probes.saturating_add(2))
        .map(|n| parent.join(format!("{name}-{n}")))
        .find(|candidate| !node_exists(candidate))
}
