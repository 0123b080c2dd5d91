// Facade for API module; delegates to submodules under src/api/

use log::Level;
use serde_json::json;

use crate::adapters::{FileWriter, FsWriter, LockManager};
use crate::checkpoint::CheckpointStore;
use crate::conflict::{resolve_roots, ConflictDetector};
use crate::constants::DEFAULT_LOCK_TIMEOUT_MS;
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::manifest::ManifestStore;
use crate::policy::Policy;
use crate::types::{
    ApplyContext, ApplyManifest, ApplyOutcome, Checkpoint, ConflictCheckResult, IntegrityReport,
    PruneResult, SafeId,
};

mod apply;
pub mod errors;

use errors::{ApiError, ErrorId};

pub struct Groundwork<E: FactsEmitter, A: AuditSink> {
    facts: E,
    audit: A,
    policy: Policy,
    lock: Option<Box<dyn LockManager>>, // None reproduces the unguarded single-invocation model
    writer: Box<dyn FileWriter>,
    lock_timeout_ms: u64,
}

impl<E: FactsEmitter, A: AuditSink> Groundwork<E, A> {
    pub fn new(facts: E, audit: A, policy: Policy) -> Self {
        Self {
            facts,
            audit,
            policy,
            lock: None,
            writer: Box::new(FsWriter),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_manager(mut self, lock: Box<dyn LockManager>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Replace the filesystem port used by the `WRITE` stage.
    pub fn with_writer(mut self, writer: Box<dyn FileWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn manifests(&self) -> ManifestStore {
        ManifestStore::new(
            self.policy.stores.manifest_dir.clone(),
            self.policy.durability.fsync,
        )
    }

    pub fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::new(
            self.policy.stores.checkpoint_dir.clone(),
            self.policy.durability.fsync,
        )
    }

    /// Run conflict detection alone. Read-only; emits nothing.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the plan does not validate.
    pub fn detect_conflicts(&self, ctx: &ApplyContext) -> Result<ConflictCheckResult, ApiError> {
        let plan = ctx.plan.validate()?;
        let (ws, target) = resolve_roots(&ctx.workspace_root, &ctx.target_directory);
        Ok(ConflictDetector::new(&self.policy.conflicts).detect(&ws, &target, &plan))
    }

    /// Materialize `ctx.plan` under `ctx.target_directory`.
    ///
    /// Never fails with an error: refusals, pending decisions, and mutation
    /// failures (after rollback) are all reported in the returned outcome.
    pub fn apply(&self, ctx: &ApplyContext) -> ApplyOutcome {
        apply::run(self, ctx)
    }

    pub fn was_applied(&self, scaffold_id: &str) -> Result<bool, ApiError> {
        Ok(self.manifests().was_applied(scaffold_id)?)
    }

    pub fn load_manifest(&self, scaffold_id: &str) -> Result<Option<ApplyManifest>, ApiError> {
        Ok(self.manifests().load(scaffold_id)?)
    }

    /// Re-hash the files recorded for `scaffold_id` and report drift.
    ///
    /// # Errors
    ///
    /// `NotFound` when the scaffold was never applied.
    pub fn validate_integrity(&self, scaffold_id: &str) -> Result<IntegrityReport, ApiError> {
        let store = self.manifests();
        let manifest = store
            .load(scaffold_id)?
            .ok_or_else(|| ApiError::NotFound(format!("no manifest for scaffold {scaffold_id}")))?;
        let report = store.validate_integrity(&manifest);
        if !report.valid {
            self.audit.log(
                Level::Warn,
                &format!(
                    "integrity: scaffold {scaffold_id} drifted ({} missing, {} changed)",
                    report.missing_files.len(),
                    report.hash_mismatches.len()
                ),
            );
        }
        Ok(report)
    }

    /// Restore a stored checkpoint onto the directory it was taken from.
    ///
    /// Emits `checkpoint_restored` with the outcome.
    pub fn restore_checkpoint(&self, checkpoint_id: &str) -> Result<Checkpoint, ApiError> {
        let id = SafeId::parse(checkpoint_id)?;
        let ckpt = self.checkpoints().load(id.as_str())?;
        let tctx = AuditCtx::new(
            &self.facts as &dyn FactsEmitter,
            ckpt.scaffold_id.clone().unwrap_or_default(),
            String::new(),
        );
        let slog = StageLogger::new(&tctx);
        match self.checkpoints().restore(&ckpt, &ckpt.target_directory) {
            Ok(()) => {
                slog.checkpoint_restored()
                    .field("checkpoint_id", json!(ckpt.id))
                    .field(
                        "target_directory",
                        json!(ckpt.target_directory.display().to_string()),
                    )
                    .emit_success();
                Ok(ckpt)
            }
            Err(e) => {
                slog.checkpoint_restored()
                    .field("checkpoint_id", json!(ckpt.id))
                    .field("error_message", json!(e.msg))
                    .error_id(ErrorId::E_RESTORE_FAILED)
                    .emit_failure();
                Err(ApiError::RestoreFailed(e.msg))
            }
        }
    }

    /// Apply `retention.checkpoint_count_limit` to the checkpoint store.
    pub fn prune_checkpoints(&self) -> Result<PruneResult, ApiError> {
        let limit = self.policy.retention.checkpoint_count_limit;
        let res = self.checkpoints().prune(limit)?;
        self.audit.log(
            Level::Info,
            &format!(
                "prune: checkpoints pruned={} retained={} (limit {:?})",
                res.pruned_count, res.retained_count, limit
            ),
        );
        Ok(res)
    }
}
