use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::conflict::ConflictCheckResult;
use super::decision::DecisionRequest;

/// Stage at which an apply failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    Precheck,
    Mkdir,
    Write,
    Finalize,
}

impl FailedStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailedStage::Precheck => "precheck",
            FailedStage::Mkdir => "mkdir",
            FailedStage::Write => "write",
            FailedStage::Finalize => "finalize",
        }
    }

    /// Only failures after mutation began are rolled back.
    pub const fn mutates(self) -> bool {
        match self {
            FailedStage::Precheck => false,
            FailedStage::Mkdir | FailedStage::Write | FailedStage::Finalize => true,
        }
    }
}

/// Result of one `apply` invocation. Every failure, including internal ones,
/// is reported through this shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_ref: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FailedStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_path: Option<String>,
    #[serde(default)]
    pub needs_input: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_conflict: Option<ConflictCheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
    #[serde(default)]
    pub rolled_back: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback_errors: Vec<String>,
    #[serde(default)]
    pub already_applied: bool,
    pub duration_ms: u64,
}
