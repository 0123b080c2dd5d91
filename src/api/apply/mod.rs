//! Apply stage: the scaffold state machine.
//!
//! `INIT -> REPLAY_CHECK -> (ALREADY_APPLIED | CONFLICT_CHECK) -> (NEEDS_DECISION | CHECKPOINT)
//! -> WRITE -> MANIFEST_WRITE -> DONE`, with `ROLLBACK -> FAILED` reachable only once
//! the target has been mutated.
//!
//! Side-effects:
//! - Emits `scaffold_*`, `decision_point_needed`, and `checkpoint_*` events in order.
//! - Holds the optional advisory lock from `CHECKPOINT` through `MANIFEST_WRITE`.
//! - Never returns an error: every failure becomes an `ApplyOutcome` with `ok=false`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::Level;
use serde_json::json;

use crate::api::errors::ErrorId;
use crate::api::Groundwork;
use crate::conflict::{resolve_roots, ConflictDetector};
use crate::fs::{
    absolutize, canonicalize_existing_prefix, clear_dir, fsync_parent_dir, node_exists,
};
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::policy::StagingPolicy;
use crate::types::ids::plan_id;
use crate::types::{ApplyContext, ApplyOutcome, ApplyStrategy, FailedStage, SafeId};

mod gating;
mod lock;
mod rollback;
mod summary;
mod write;

use gating::{Gate, WriteMode};
use rollback::Protection;
use summary::{outcome_from_manifest, ManifestDraft};

fn elapsed_ms(t0: Instant) -> u64 {
    u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX)
}

struct Failure {
    stage: FailedStage,
    id: ErrorId,
    msg: String,
    path: Option<String>,
}

impl Failure {
    fn precheck(id: ErrorId, msg: impl Into<String>) -> Self {
        Self {
            stage: FailedStage::Precheck,
            id,
            msg: msg.into(),
            path: None,
        }
    }
}

#[allow(clippy::too_many_lines)]
pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
    ctx: &ApplyContext,
) -> ApplyOutcome {
    let t0 = Instant::now();
    let pid = plan_id(&ctx.plan);
    let tctx = AuditCtx::new(
        &api.facts as &dyn FactsEmitter,
        ctx.scaffold_id.clone(),
        pid.to_string(),
    );
    let slog = StageLogger::new(&tctx);

    // INIT: nothing below may run for a replayed invocation.
    if ctx.is_replay {
        return fail(
            api,
            &slog,
            t0,
            Failure::precheck(ErrorId::E_REPLAY, "apply refused: invocation is a replay"),
            None,
        );
    }
    if let Err(e) = SafeId::parse(&ctx.scaffold_id) {
        return fail(
            api,
            &slog,
            t0,
            Failure::precheck(ErrorId::E_INVALID_PLAN, e.msg),
            None,
        );
    }
    api.audit.log(
        Level::Info,
        &format!("apply: starting scaffold {}", ctx.scaffold_id),
    );

    // REPLAY_CHECK
    match already_applied(api, &ctx.scaffold_id, t0) {
        Ok(Some(done)) => return done,
        Ok(None) => {}
        Err(msg) => {
            return fail(api, &slog, t0, Failure::precheck(ErrorId::E_MANIFEST, msg), None);
        }
    }

    let plan = match ctx.plan.validate() {
        Ok(p) => p,
        Err(e) => {
            return fail(
                api,
                &slog,
                t0,
                Failure::precheck(ErrorId::E_INVALID_PLAN, e.msg),
                None,
            );
        }
    };
    let (ws, target) = resolve_roots(&ctx.workspace_root, &ctx.target_directory);
    if let Some(inside) = store_inside_target(api, &target) {
        let msg = format!(
            "target {} contains groundwork state {}",
            target.display(),
            inside.display()
        );
        return fail(api, &slog, t0, Failure::precheck(ErrorId::E_INVALID_PLAN, msg), None);
    }
    slog.apply_started()
        .merge(&json!({
            "target_directory": target.display().to_string(),
            "files_count": ctx.plan.files_count(),
            "directories_count": ctx.plan.directories_count(),
            "conflict_mode": ctx.conflict_mode,
            "replace_confirmed": ctx.replace_confirmed,
        }))
        .emit_success();

    // CONFLICT_CHECK
    let conflicts = ConflictDetector::new(&api.policy.conflicts).detect(&ws, &target, &plan);
    if conflicts.has_conflicts {
        slog.conflict_detected()
            .merge(&json!({
                "conflicts": conflicts.conflicts,
                "suggested_actions": conflicts.suggested_actions,
                "default_action": conflicts.default_action,
                "summary": conflicts.summary,
            }))
            .emit_warn();
    }
    let mode = match gating::evaluate(ctx, &target, &conflicts) {
        Gate::Proceed(mode) => mode,
        Gate::Cancelled => {
            return fail(
                api,
                &slog,
                t0,
                Failure::precheck(ErrorId::E_CANCELLED, "apply cancelled by user"),
                None,
            );
        }
        Gate::NeedsDecision(request) => {
            slog.decision_needed()
                .merge(&json!({
                    "decision_type": request.decision_type.as_str(),
                    "check_id": request.check_id,
                    "options": request.options,
                    "default_option": request.default_option,
                    "target_directory": target.display().to_string(),
                }))
                .emit_warn();
            api.audit.log(
                Level::Info,
                &format!(
                    "apply: waiting for decision {}",
                    request.decision_type.as_str()
                ),
            );
            return ApplyOutcome {
                needs_input: true,
                pending_conflict: Some(conflicts),
                decision: Some(request),
                duration_ms: elapsed_ms(t0),
                ..ApplyOutcome::default()
            };
        }
    };

    let lock = match lock::acquire(api) {
        Ok(l) => l,
        Err(f) => return fail(api, &slog, t0, Failure::precheck(f.id, f.msg), None),
    };
    let guard = lock.guard;
    if guard.is_some() {
        // another holder may have finished this scaffold while we waited
        match already_applied(api, &ctx.scaffold_id, t0) {
            Ok(Some(done)) => return done,
            Ok(None) => {}
            Err(msg) => {
                return fail(api, &slog, t0, Failure::precheck(ErrorId::E_MANIFEST, msg), None);
            }
        }
    }

    // CHECKPOINT
    let staged = api.policy.apply.staging == StagingPolicy::WhenTargetAbsent
        && mode == WriteMode::Clean
        && !node_exists(&target);
    let mut protection = if staged {
        Protection::Staging {
            dir: write::staging_dir_for(&target),
            renamed: false,
        }
    } else {
        match api.checkpoints().snapshot(&ctx.scaffold_id, &target) {
            Ok(ckpt) => {
                slog.checkpoint_created()
                    .merge(&json!({
                        "checkpoint_id": ckpt.id,
                        "target_directory": target.display().to_string(),
                        "entries": ckpt.entries.len(),
                        "target_existed": ckpt.target_existed,
                    }))
                    .emit_success();
                Protection::Checkpoint(ckpt)
            }
            Err(e) => {
                return fail(
                    api,
                    &slog,
                    t0,
                    Failure::precheck(ErrorId::E_CHECKPOINT, e.msg),
                    None,
                );
            }
        }
    };

    // From here on the target may change; every failure rolls back.
    if mode == WriteMode::ReplaceAll {
        api.audit.log(
            Level::Warn,
            &format!("apply: clearing {} (replace confirmed)", target.display()),
        );
        if let Err(e) = clear_dir(&target) {
            let f = Failure {
                stage: FailedStage::Write,
                id: ErrorId::E_WRITE,
                msg: format!("clear {}: {e}", target.display()),
                path: Some(target.display().to_string()),
            };
            return fail(api, &slog, t0, f, Some((&protection, &target)));
        }
    }

    // WRITE
    let (to_write, skipped) = write::partition(&target, &plan.files, mode);
    let dirs = plan.all_dirs();
    let durable = api.policy.durability.fsync;
    let root: PathBuf = match &protection {
        Protection::Staging { dir, .. } => dir.clone(),
        Protection::Checkpoint(_) => target.clone(),
    };
    if let Err(w) = write::materialize(api.writer.as_ref(), &root, &dirs, &to_write, durable) {
        let f = Failure {
            stage: w.stage,
            id: ErrorId::E_WRITE,
            msg: w.msg,
            path: Some(w.path),
        };
        return fail(api, &slog, t0, f, Some((&protection, &target)));
    }
    if let Protection::Staging { dir, .. } = &protection {
        if let Err(e) = std::fs::rename(dir, &target) {
            let f = Failure {
                stage: FailedStage::Write,
                id: ErrorId::E_WRITE,
                msg: format!("rename {} -> {}: {e}", dir.display(), target.display()),
                path: Some(target.display().to_string()),
            };
            return fail(api, &slog, t0, f, Some((&protection, &target)));
        }
        if durable {
            let _ = fsync_parent_dir(&target);
        }
    }
    if let Protection::Staging { renamed, .. } = &mut protection {
        *renamed = true;
    }

    // MANIFEST_WRITE
    let strategy = match &protection {
        Protection::Checkpoint(_) => ApplyStrategy::Checkpoint,
        Protection::Staging { .. } => ApplyStrategy::TempStaging,
    };
    let manifest = ManifestDraft {
        ctx,
        plan_id: pid,
        target: &target,
        written: &to_write,
        dirs: &dirs,
        skipped: &skipped,
        checkpoint_id: protection.checkpoint_id(),
        strategy,
    }
    .build(elapsed_ms(t0));
    let manifest_ref = match api.manifests().write(&manifest) {
        Ok(p) => p,
        Err(e) => {
            let f = Failure {
                stage: FailedStage::Finalize,
                id: ErrorId::E_MANIFEST,
                msg: e.msg,
                path: api
                    .manifests()
                    .path_for(&ctx.scaffold_id)
                    .ok()
                    .map(|p| p.display().to_string()),
            };
            return fail(api, &slog, t0, f, Some((&protection, &target)));
        }
    };

    // DONE
    let outcome = outcome_from_manifest(&manifest, manifest_ref, false, elapsed_ms(t0));
    let mut ev = slog
        .applied()
        .field("files_created", json!(outcome.created_files))
        .field("dirs_created", json!(outcome.created_dirs))
        .field("manifest_ref", json!(outcome.manifest_ref))
        .field("strategy", json!(manifest.strategy))
        .field("lock_backend", json!(lock.backend))
        .field("lock_wait_ms", json!(lock.wait_ms))
        .field("duration_ms", json!(outcome.duration_ms));
    if let Some(id) = &outcome.checkpoint_id {
        ev = ev.field("checkpoint_id", json!(id));
    }
    if !outcome.skipped_files.is_empty() {
        ev = ev.field("skipped_files", json!(outcome.skipped_files));
    }
    ev.emit_success();
    api.audit.log(
        Level::Info,
        &format!(
            "apply: scaffold {} applied ({} files, {} skipped)",
            ctx.scaffold_id,
            outcome.created_files.len(),
            outcome.skipped_files.len()
        ),
    );
    drop(guard);
    outcome
}

/// First of the manifest store, checkpoint store, or lock file that lies
/// inside `target`. A replace of such a target would erase it.
fn store_inside_target<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
    target: &Path,
) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let resolve = |p: &Path| {
        let abs = absolutize(p, &cwd);
        canonicalize_existing_prefix(&abs).unwrap_or(abs)
    };
    let real_target = resolve(target);
    let stores = &api.policy.stores;
    let lock_file = api.lock.as_ref().and_then(|l| l.lock_path());
    [
        Some(stores.manifest_dir.as_path()),
        Some(stores.checkpoint_dir.as_path()),
        lock_file,
    ]
    .into_iter()
    .flatten()
    .find(|p| resolve(p).starts_with(&real_target))
    .map(Path::to_path_buf)
}

fn already_applied<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
    scaffold_id: &str,
    t0: Instant,
) -> Result<Option<ApplyOutcome>, String> {
    let store = api.manifests();
    let Some(manifest) = store.load(scaffold_id).map_err(|e| e.msg)? else {
        return Ok(None);
    };
    let path = store.path_for(scaffold_id).map_err(|e| e.msg)?;
    api.audit.log(
        Level::Info,
        &format!("apply: scaffold {scaffold_id} already applied; nothing to do"),
    );
    Ok(Some(outcome_from_manifest(
        &manifest,
        path,
        true,
        elapsed_ms(t0),
    )))
}

/// Report a failure. When `mutated` is given the target may have changed
/// and is rolled back first.
fn fail<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
    slog: &StageLogger<'_>,
    t0: Instant,
    f: Failure,
    mutated: Option<(&Protection, &Path)>,
) -> ApplyOutcome {
    let (rolled_back, rollback_errors, checkpoint_id) = match mutated {
        Some((p, target)) => {
            let errors = rollback::run(api, slog, p, target);
            (true, errors, p.checkpoint_id())
        }
        None => (false, Vec::new(), None),
    };
    let mut ev = slog
        .apply_failed()
        .field("stage", json!(f.stage.as_str()))
        .field("error_message", json!(f.msg))
        .error_id(f.id);
    if let Some(p) = &f.path {
        ev = ev.field("failed_path", json!(p));
    }
    if let Some(id) = &checkpoint_id {
        ev = ev.field("checkpoint_id", json!(id));
    }
    if rolled_back {
        ev = ev
            .field("rolled_back", json!(true))
            .field("rollback_errors", json!(rollback_errors));
    }
    ev.emit_failure();
    api.audit.log(
        Level::Error,
        &format!("apply: failed at {}: {}", f.stage.as_str(), f.msg),
    );
    ApplyOutcome {
        ok: false,
        error: Some(f.msg),
        error_id: Some(crate::api::errors::id_str(f.id).to_string()),
        failed_stage: Some(f.stage),
        failed_path: f.path,
        checkpoint_id,
        rolled_back,
        rollback_errors,
        duration_ms: elapsed_ms(t0),
        ..ApplyOutcome::default()
    }
}
