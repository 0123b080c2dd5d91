//! Conflict detection for a scaffold target.
//!
//! Detection is read-only and conservative: anything that cannot be inspected
//! is reported as a conflict instead of being assumed clean.

pub mod checks;

use std::path::{Path, PathBuf};

use crate::constants::MAX_ALT_DIR_PROBES;
use crate::fs::absolutize;
use crate::policy::types::Conflicts;
use crate::types::{ConflictAction, ConflictCheckResult, ConflictRecord, ValidatedPlan};

pub use checks::{
    check_containment, check_existing_files, check_plan_containment, check_target_state,
    suggest_new_dir,
};

/// Absolute workspace root and target directory for a context.
///
/// The workspace is resolved against the process working directory and the
/// target against the workspace.
pub fn resolve_roots(workspace_root: &Path, target_directory: &Path) -> (PathBuf, PathBuf) {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let ws = absolutize(workspace_root, &cwd);
    let target = absolutize(target_directory, &ws);
    (ws, target)
}

#[derive(Clone, Copy, Debug)]
pub struct ConflictDetector<'a> {
    policy: &'a Conflicts,
}

impl<'a> ConflictDetector<'a> {
    pub const fn new(policy: &'a Conflicts) -> Self {
        Self { policy }
    }

    /// Inspect `target_directory` for anything an apply of `plan` would clobber.
    ///
    /// Containment is checked first; a target outside the workspace, or a plan
    /// directory that a symlink under the target leads out of it, short-circuits
    /// and only offers `choose_new_dir` and `cancel`.
    pub fn detect(
        &self,
        workspace_root: &Path,
        target_directory: &Path,
        plan: &ValidatedPlan,
    ) -> ConflictCheckResult {
        let (ws, target) = resolve_roots(workspace_root, target_directory);

        if let Some(rec) = check_containment(&ws, &target) {
            let suggested_dir = suggest_new_dir(&ws, &target, true, MAX_ALT_DIR_PROBES);
            return Self::result(
                vec![rec],
                vec![ConflictAction::ChooseNewDir, ConflictAction::Cancel],
                suggested_dir,
            );
        }

        let escapes = check_plan_containment(&ws, &target, plan);
        if !escapes.is_empty() {
            let suggested_dir = suggest_new_dir(&ws, &target, false, MAX_ALT_DIR_PROBES);
            return Self::result(
                escapes,
                vec![ConflictAction::ChooseNewDir, ConflictAction::Cancel],
                suggested_dir,
            );
        }

        let mut conflicts: Vec<ConflictRecord> = Vec::new();
        let target_is_dir = match check_target_state(self.policy, &target) {
            Some(rec) => {
                let is_dir = rec.reason == crate::types::ConflictReason::DirNotEmpty;
                conflicts.push(rec);
                is_dir
            }
            None => true,
        };
        if target_is_dir {
            conflicts.extend(check_existing_files(&target, &plan.files));
        }
        if conflicts.is_empty() {
            return ConflictCheckResult::clean();
        }
        let suggested_dir = suggest_new_dir(&ws, &target, false, MAX_ALT_DIR_PROBES);
        Self::result(
            conflicts,
            vec![
                ConflictAction::ChooseNewDir,
                ConflictAction::MergeSafeOnly,
                ConflictAction::ReplaceAll,
                ConflictAction::Cancel,
            ],
            suggested_dir,
        )
    }

    fn result(
        conflicts: Vec<ConflictRecord>,
        suggested_actions: Vec<ConflictAction>,
        suggested_dir: Option<PathBuf>,
    ) -> ConflictCheckResult {
        let summary = summarize(&conflicts);
        ConflictCheckResult {
            has_conflicts: true,
            conflicts,
            suggested_actions,
            default_action: ConflictAction::ChooseNewDir,
            summary,
            suggested_dir,
        }
    }
}

fn summarize(conflicts: &[ConflictRecord]) -> String {
    match conflicts {
        [] => "no conflicts".to_string(),
        [only] => only.description.clone(),
        [first, rest @ ..] => format!("{} (and {} more conflicts)", first.description, rest.len()),
    }
}
