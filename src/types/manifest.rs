use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the apply protected the target while writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStrategy {
    Checkpoint,
    TempStaging,
}

/// Evidence for one written file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
    /// Octal permission string, present for executable files (e.g. `"755"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Durable proof that an apply completed. Written at most once per scaffold id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyManifest {
    #[serde(default)]
    pub schema_version: u32,
    pub scaffold_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub target_directory: PathBuf,
    pub created_at: String,
    pub files: Vec<ManifestFile>,
    pub dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
    pub strategy: ApplyStrategy,
    pub duration_ms: u64,
}

/// Drift report produced by `ManifestStore::validate_integrity`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub missing_files: Vec<String>,
    pub hash_mismatches: Vec<String>,
}
