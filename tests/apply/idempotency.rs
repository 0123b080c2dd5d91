use groundwork::types::PlanItem;

use crate::common::{plan, tree, Sandbox};

#[test]
fn second_apply_with_same_scaffold_id_writes_nothing() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api();
    let ctx = sb.ctx(
        "idem-1",
        plan(vec![PlanItem::dir("src"), PlanItem::file("src/main.rs", "fn main() {}\n")]),
        "app",
    );

    let first = api.apply(&ctx);
    assert!(first.ok, "{first:?}");
    assert!(!first.already_applied);
    let before = tree(&sb.path("app"));
    let checkpoints_before = api.checkpoints().list().unwrap().len();
    let events_before = facts.len();

    let second = api.apply(&ctx);
    assert!(second.ok);
    assert!(second.already_applied);
    assert_eq!(second.manifest_ref, first.manifest_ref);
    assert_eq!(second.created_files, first.created_files);
    assert_eq!(tree(&sb.path("app")), before);
    assert_eq!(api.checkpoints().list().unwrap().len(), checkpoints_before);
    assert_eq!(facts.len(), events_before, "replay check must not publish events");
}

#[test]
fn idempotency_is_keyed_on_scaffold_id_only() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    let first = api.apply(&sb.ctx("idem-2", plan(vec![PlanItem::file("a.txt", "A")]), "app"));
    assert!(first.ok);

    // different plan, same id: still a no-op
    let out = api.apply(&sb.ctx("idem-2", plan(vec![PlanItem::file("b.txt", "B")]), "app"));
    assert!(out.ok && out.already_applied);
    assert!(!sb.path("app/b.txt").exists());
    assert_eq!(out.created_files, vec!["a.txt"]);
    assert!(api.was_applied("idem-2").unwrap());
    assert!(!api.was_applied("idem-3").unwrap());
}
