use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::constants::DOC_SCHEMA_VERSION;
use crate::fs::sha256_hex;
use crate::logging::now_iso;
use crate::types::{
    ApplyContext, ApplyManifest, ApplyOutcome, ApplyStrategy, ManifestFile, PlanPath, PlannedFile,
};

/// Evidence for a finished write stage. Hashes are taken over the exact bytes
/// handed to the writer.
pub(crate) struct ManifestDraft<'a> {
    pub ctx: &'a ApplyContext,
    pub plan_id: Uuid,
    pub target: &'a Path,
    pub written: &'a [&'a PlannedFile],
    pub dirs: &'a [PlanPath],
    pub skipped: &'a [String],
    pub checkpoint_id: Option<String>,
    pub strategy: ApplyStrategy,
}

impl ManifestDraft<'_> {
    pub(crate) fn build(self, duration_ms: u64) -> ApplyManifest {
        let files = self
            .written
            .iter()
            .map(|f| ManifestFile {
                path: f.path.to_string(),
                sha256: sha256_hex(f.content.as_bytes()),
                bytes: f.content.len() as u64,
                mode: f.executable.then(|| format!("{:o}", super::write::mode_for(f))),
            })
            .collect();
        ApplyManifest {
            schema_version: DOC_SCHEMA_VERSION,
            scaffold_id: self.ctx.scaffold_id.clone(),
            recipe_id: self.ctx.recipe_id.clone(),
            plan_id: Some(self.plan_id.to_string()),
            target_directory: self.target.to_path_buf(),
            created_at: now_iso(),
            files,
            dirs: self.dirs.iter().map(ToString::to_string).collect(),
            skipped_files: self.skipped.to_vec(),
            checkpoint_id: self.checkpoint_id,
            strategy: self.strategy,
            duration_ms,
        }
    }
}

/// Successful outcome describing `manifest`, whether just written or found
/// by the replay check.
pub(crate) fn outcome_from_manifest(
    manifest: &ApplyManifest,
    manifest_ref: PathBuf,
    already_applied: bool,
    duration_ms: u64,
) -> ApplyOutcome {
    ApplyOutcome {
        ok: true,
        manifest_ref: Some(manifest_ref),
        created_files: manifest.files.iter().map(|f| f.path.clone()).collect(),
        created_dirs: manifest.dirs.clone(),
        skipped_files: manifest.skipped_files.clone(),
        checkpoint_id: manifest.checkpoint_id.clone(),
        already_applied,
        duration_ms,
        ..ApplyOutcome::default()
    }
}
