use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Why a path blocks a clean apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    Exists,
    DirNotEmpty,
    OutsideWorkspace,
}

impl ConflictReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConflictReason::Exists => "exists",
            ConflictReason::DirNotEmpty => "dir_not_empty",
            ConflictReason::OutsideWorkspace => "outside_workspace",
        }
    }
}

/// Remedies offered for a conflict. Also used as the caller's chosen
/// conflict mode on re-invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAction {
    ChooseNewDir,
    MergeSafeOnly,
    ReplaceAll,
    Cancel,
}

impl ConflictAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConflictAction::ChooseNewDir => "choose_new_dir",
            ConflictAction::MergeSafeOnly => "merge_safe_only",
            ConflictAction::ReplaceAll => "replace_all",
            ConflictAction::Cancel => "cancel",
        }
    }

    /// Whether choosing this action can delete or skip user content in place.
    pub const fn is_in_place(self) -> bool {
        match self {
            ConflictAction::MergeSafeOnly | ConflictAction::ReplaceAll => true,
            ConflictAction::ChooseNewDir | ConflictAction::Cancel => false,
        }
    }
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected conflict. Produced fresh on every detection pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Plan-relative path for `exists`; the target directory itself otherwise.
    pub path: String,
    pub reason: ConflictReason,
    pub description: String,
}

/// Result of a detection pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCheckResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRecord>,
    pub suggested_actions: Vec<ConflictAction>,
    pub default_action: ConflictAction,
    pub summary: String,
    /// Concrete directory proposed for `choose_new_dir`, when one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_dir: Option<PathBuf>,
}

impl ConflictCheckResult {
    pub fn clean() -> Self {
        Self {
            has_conflicts: false,
            conflicts: Vec::new(),
            suggested_actions: Vec::new(),
            default_action: ConflictAction::ChooseNewDir,
            summary: "no conflicts".to_string(),
            suggested_dir: None,
        }
    }

    pub fn is_outside_workspace(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| c.reason == ConflictReason::OutsideWorkspace)
    }

    pub fn offers(&self, action: ConflictAction) -> bool {
        self.suggested_actions.contains(&action)
    }
}
