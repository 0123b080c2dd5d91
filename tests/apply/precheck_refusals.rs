use groundwork::adapters::FileLockManager;
use groundwork::policy::Policy;
use groundwork::types::{ConflictAction, FailedStage, PlanItem};

use crate::common::{plan, Sandbox};

#[test]
fn replay_is_refused_before_any_filesystem_access() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api();
    let ctx = sb
        .ctx("replay-1", plan(vec![PlanItem::file("a", "1")]), "app")
        .as_replay();

    let out = api.apply(&ctx);
    assert!(!out.ok);
    assert_eq!(out.error_id.as_deref(), Some("E_REPLAY"));
    assert_eq!(out.failed_stage, Some(FailedStage::Precheck));
    assert!(!out.rolled_back);
    assert!(!sb.path("app").exists());
    assert!(!sb.state.exists());
    assert_eq!(facts.names(), vec!["scaffold_apply_failed"]);
    assert_eq!(facts.of_type("scaffold_apply_failed")[0]["payload"]["exit_code"], 10);
}

#[test]
fn invalid_plan_is_refused() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    for items in [
        vec![PlanItem::file("../evil", "x")],
        vec![PlanItem::file("/etc/passwd", "x")],
        vec![PlanItem::file("a", "1"), PlanItem::file("a", "2")],
    ] {
        let out = api.apply(&sb.ctx("invalid-1", plan(items), "app"));
        assert_eq!(out.error_id.as_deref(), Some("E_INVALID_PLAN"), "{out:?}");
        assert!(!sb.path("app").exists());
    }
    let bad = sb.ctx("invalid-1", plan(vec![PlanItem::file("../x", "")]), "app");
    assert!(api.detect_conflicts(&bad).is_err());
}

#[test]
fn unsafe_scaffold_id_is_refused() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    let out = api.apply(&sb.ctx("../../etc", plan(vec![PlanItem::file("a", "1")]), "app"));
    assert_eq!(out.error_id.as_deref(), Some("E_INVALID_PLAN"));
    assert!(!sb.state.exists());
}

#[test]
fn cancel_aborts_even_without_conflicts() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api();
    let out = api.apply(
        &sb.ctx("cancel-1", plan(vec![PlanItem::file("a", "1")]), "app")
            .with_conflict_mode(ConflictAction::Cancel),
    );
    assert!(!out.ok);
    assert_eq!(out.error_id.as_deref(), Some("E_CANCELLED"));
    assert!(!sb.path("app").exists());
    assert!(facts.of_type("checkpoint_created").is_empty());
}

#[test]
fn target_containing_the_state_stores_is_refused() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api_with(Policy::sandbox(&sb.ws.join(".groundwork")));
    let first = api.apply(&sb.ctx("first", plan(vec![PlanItem::file("a", "1")]), "sub"));
    assert!(first.ok, "{first:?}");

    let ctx = sb
        .ctx("second", plan(vec![PlanItem::file("b", "2")]), ".")
        .with_conflict_mode(ConflictAction::ReplaceAll)
        .with_replace_confirmed(true);
    let out = api.apply(&ctx);
    assert_eq!(out.error_id.as_deref(), Some("E_INVALID_PLAN"), "{out:?}");
    assert!(!out.rolled_back);
    assert!(api.was_applied("first").unwrap());
    assert_eq!(std::fs::read_to_string(sb.path("sub/a")).unwrap(), "1");
    assert!(!sb.path("b").exists());
    assert_eq!(facts.of_type("scaffold_apply_failed").len(), 1);
    assert_eq!(facts.of_type("checkpoint_created").len(), 1);
}

#[test]
fn target_containing_the_lock_file_is_refused() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    let api = api.with_lock_manager(Box::new(FileLockManager::new(sb.path("app/.lock"))));
    let out = api.apply(&sb.ctx("lock-inside", plan(vec![PlanItem::file("a", "1")]), "app"));
    assert_eq!(out.error_id.as_deref(), Some("E_INVALID_PLAN"), "{out:?}");
    assert!(out.error.unwrap().contains(".lock"));
}
