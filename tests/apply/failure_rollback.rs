use std::collections::BTreeMap;
use std::path::Path;

use groundwork::adapters::{FileWriter, FsWriter};
use groundwork::types::errors::Result;
use groundwork::types::{ConflictAction, FailedStage, PlanItem};

use crate::common::{plan, tree, FailOn, Sandbox};

fn abc_plan() -> groundwork::types::Plan {
    plan(vec![PlanItem::file("b.txt", "B"), PlanItem::file("c.txt", "C")])
}

#[test]
fn write_failure_restores_exact_prior_tree() {
    let sb = Sandbox::new();
    sb.write("app/a.txt", "A");
    let (api, facts, _audit) = sb.api();
    let api = api.with_writer(FailOn::boxed("c.txt"));
    let ctx = sb
        .ctx("rb-1", abc_plan(), "app")
        .with_conflict_mode(ConflictAction::MergeSafeOnly);

    let out = api.apply(&ctx);
    assert!(!out.ok);
    assert_eq!(out.failed_stage, Some(FailedStage::Write));
    assert_eq!(out.failed_path.as_deref(), Some("c.txt"));
    assert_eq!(out.error_id.as_deref(), Some("E_WRITE"));
    assert!(out.rolled_back);
    assert!(out.rollback_errors.is_empty(), "{:?}", out.rollback_errors);
    assert!(out.checkpoint_id.is_some());

    let mut expected = BTreeMap::new();
    expected.insert("a.txt".to_string(), Some(b"A".to_vec()));
    assert_eq!(tree(&sb.path("app")), expected);
    assert!(!api.was_applied("rb-1").unwrap());

    let names = facts.names();
    let pos = |n: &str| names.iter().position(|x| x == n).unwrap();
    assert!(pos("checkpoint_created") < pos("checkpoint_restored"));
    assert!(pos("checkpoint_restored") < pos("scaffold_apply_failed"));
    let failed = &facts.of_type("scaffold_apply_failed")[0];
    assert_eq!(failed["payload"]["stage"], "write");
    assert_eq!(failed["payload"]["failed_path"], "c.txt");
    assert_eq!(failed["payload"]["exit_code"], 50);
}

#[test]
fn failure_on_fresh_target_leaves_nothing_behind() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    let api = api.with_writer(FailOn::boxed("c.txt"));
    let out = api.apply(&sb.ctx(
        "rb-2",
        plan(vec![
            PlanItem::dir("src"),
            PlanItem::file("src/b.txt", "B"),
            PlanItem::file("src/c.txt", "C"),
        ]),
        "fresh",
    ));
    assert!(!out.ok && out.rolled_back);
    assert!(!sb.path("fresh").exists());
}

/// Publishes a rival manifest for the same scaffold id mid-write, as a
/// concurrent apply would.
struct RivalManifest {
    manifest: std::path::PathBuf,
}

impl FileWriter for RivalManifest {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        FsWriter.create_dir_all(path)
    }

    fn write_file(&self, path: &Path, content: &[u8], mode: u32, durable: bool) -> Result<()> {
        if !self.manifest.exists() {
            std::fs::create_dir_all(self.manifest.parent().unwrap()).unwrap();
            std::fs::write(&self.manifest, b"{}").unwrap();
        }
        FsWriter.write_file(path, content, mode, durable)
    }
}

#[test]
fn manifest_failure_rolls_back_at_finalize() {
    let sb = Sandbox::new();
    sb.write("app/a.txt", "A");
    let (api, facts, _audit) = sb.api();
    let manifest = api.manifests().path_for("rb-3").unwrap();
    let api = api.with_writer(Box::new(RivalManifest { manifest: manifest.clone() }));
    let ctx = sb
        .ctx("rb-3", abc_plan(), "app")
        .with_conflict_mode(ConflictAction::MergeSafeOnly);

    let out = api.apply(&ctx);
    assert!(!out.ok);
    assert_eq!(out.failed_stage, Some(FailedStage::Finalize));
    assert_eq!(out.error_id.as_deref(), Some("E_MANIFEST"));
    assert!(out.rolled_back);
    assert_eq!(tree(&sb.path("app")).len(), 1);
    // the rival document is not ours to remove
    assert_eq!(std::fs::read(&manifest).unwrap(), b"{}");
    assert_eq!(facts.of_type("checkpoint_restored").len(), 1);
}

#[test]
fn stored_checkpoint_can_be_restored_later() {
    let sb = Sandbox::new();
    sb.write("app/a.txt", "A");
    let (api, facts, _audit) = sb.api();
    let out = api.apply(
        &sb.ctx("rb-4", abc_plan(), "app")
            .with_conflict_mode(ConflictAction::MergeSafeOnly),
    );
    assert!(out.ok, "{out:?}");
    assert_eq!(tree(&sb.path("app")).len(), 3);

    let ckpt = api.restore_checkpoint(out.checkpoint_id.as_deref().unwrap()).unwrap();
    assert_eq!(ckpt.scaffold_id.as_deref(), Some("rb-4"));
    assert_eq!(tree(&sb.path("app")).len(), 1);
    let restored = facts.of_type("checkpoint_restored");
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0]["decision"], "success");

    assert!(api.restore_checkpoint("ckpt_does_not_exist").is_err());
}
