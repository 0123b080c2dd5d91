use groundwork::types::{ConflictAction, ConflictReason, PlanItem};

use crate::common::{plan, Sandbox};

#[test]
fn target_outside_workspace_only_offers_new_dir_or_cancel() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api();
    let ctx = sb.ctx("escape-1", plan(vec![PlanItem::file("a", "1")]), "../outside");

    let out = api.apply(&ctx);
    assert!(!out.ok && out.needs_input);
    let pending = out.pending_conflict.unwrap();
    assert!(pending.is_outside_workspace());
    assert_eq!(pending.conflicts[0].reason, ConflictReason::OutsideWorkspace);
    assert_eq!(
        pending.suggested_actions,
        vec![ConflictAction::ChooseNewDir, ConflictAction::Cancel]
    );
    assert_eq!(pending.suggested_dir, Some(sb.ws.join("outside")));
    let options: Vec<String> = out.decision.unwrap().options.into_iter().map(|o| o.id).collect();
    assert_eq!(options, vec!["choose_new_dir", "cancel"]);

    assert!(!sb.td.path().join("outside").exists());
    assert!(!sb.state.exists());
    assert_eq!(facts.of_type("scaffold_conflict_detected").len(), 1);
}

#[test]
fn in_place_modes_are_not_honored_outside_the_workspace() {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.td.path().join("outside")).unwrap();
    let (api, _facts, _audit) = sb.api();
    for mode in [ConflictAction::ReplaceAll, ConflictAction::MergeSafeOnly] {
        let ctx = sb
            .ctx("escape-2", plan(vec![PlanItem::file("a", "1")]), "../outside")
            .with_conflict_mode(mode)
            .with_replace_confirmed(true);
        let out = api.apply(&ctx);
        assert!(out.needs_input, "{mode}: {out:?}");
        assert!(!sb.td.path().join("outside/a").exists());
    }
}

#[test]
fn symlinked_escape_is_detected() {
    let sb = Sandbox::new();
    let elsewhere = sb.td.path().join("elsewhere");
    std::fs::create_dir_all(&elsewhere).unwrap();
    std::os::unix::fs::symlink(&elsewhere, sb.path("link")).unwrap();
    let (api, _facts, _audit) = sb.api();

    let ctx = sb.ctx("escape-3", plan(vec![PlanItem::file("a", "1")]), "link/app");
    let res = api.detect_conflicts(&ctx).unwrap();
    assert!(res.is_outside_workspace());

    let out = api.apply(&ctx);
    assert!(out.needs_input);
    assert!(!elsewhere.join("app").exists());
}

#[test]
fn symlink_inside_target_cannot_carry_writes_out_of_the_workspace() {
    let sb = Sandbox::new();
    let outside = sb.td.path().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    std::fs::create_dir_all(sb.path("app")).unwrap();
    std::os::unix::fs::symlink(&outside, sb.path("app/src")).unwrap();
    let (api, facts, _audit) = sb.api();

    let ctx = sb
        .ctx("escape-4", plan(vec![PlanItem::file("src/lib/evil.ts", "x")]), "app")
        .with_conflict_mode(ConflictAction::MergeSafeOnly);
    let res = api.detect_conflicts(&ctx).unwrap();
    assert!(res.is_outside_workspace());
    assert_eq!(res.conflicts[0].path, "src");
    assert_eq!(
        res.suggested_actions,
        vec![ConflictAction::ChooseNewDir, ConflictAction::Cancel]
    );

    let out = api.apply(&ctx);
    assert!(!out.ok && out.needs_input, "{out:?}");
    assert!(!outside.join("lib").exists());
    assert!(!api.was_applied("escape-4").unwrap());
    assert!(facts.of_type("checkpoint_created").is_empty());
}

#[test]
fn symlink_to_elsewhere_in_workspace_is_refused_at_write() {
    let sb = Sandbox::new();
    sb.write("shared/keep.txt", "mine");
    std::fs::create_dir_all(sb.path("app")).unwrap();
    std::os::unix::fs::symlink(sb.path("shared"), sb.path("app/src")).unwrap();
    let (api, _facts, _audit) = sb.api();

    let ctx = sb
        .ctx("escape-5", plan(vec![PlanItem::file("src/new.ts", "x")]), "app")
        .with_conflict_mode(ConflictAction::MergeSafeOnly);
    let out = api.apply(&ctx);
    assert_eq!(out.error_id.as_deref(), Some("E_WRITE"), "{out:?}");
    assert!(out.rolled_back);
    assert!(!sb.path("shared/new.ts").exists());
    assert_eq!(std::fs::read_to_string(sb.path("shared/keep.txt")).unwrap(), "mine");
}
