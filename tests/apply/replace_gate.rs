use groundwork::apply_selections;
use groundwork::decision::CONFIRM_REPLACE;
use groundwork::types::{ConflictAction, DecisionType, PlanItem, Selection};

use crate::common::{plan, tree, Sandbox};

#[test]
fn replace_all_needs_a_second_confirmation() {
    let sb = Sandbox::new();
    sb.write("app/package.json", "{\"name\":\"old\"}");
    sb.write("app/old/notes.txt", "keep me?");
    let before = tree(&sb.path("app"));
    let (api, facts, _audit) = sb.api();

    let ctx = sb
        .ctx(
            "replace-1",
            plan(vec![
                PlanItem::file("package.json", "{\"name\":\"new\"}"),
                PlanItem::file("src/index.ts", "export {}\n"),
            ]),
            "app",
        )
        .with_conflict_mode(ConflictAction::ReplaceAll);

    let first = api.apply(&ctx);
    assert!(!first.ok);
    assert!(first.needs_input);
    let request = first.decision.clone().unwrap();
    assert_eq!(request.decision_type, DecisionType::ScaffoldReplaceConfirm);
    assert_eq!(request.check_id, "scaffold_replace_confirm:replace-1");
    assert_eq!(request.default_option, "choose_new_dir");
    assert!(request.option(CONFIRM_REPLACE).is_some());
    assert_eq!(tree(&sb.path("app")), before);
    assert!(facts.of_type("checkpoint_created").is_empty());
    assert_eq!(facts.of_type("decision_point_needed").len(), 1);

    let next = apply_selections(
        &ctx,
        &first,
        &[Selection::new(request.check_id.clone(), CONFIRM_REPLACE)],
    )
    .unwrap()
    .unwrap();
    assert!(next.replace_confirmed);

    let out = api.apply(&next);
    assert!(out.ok, "{out:?}");
    assert!(!sb.path("app/old").exists());
    assert_eq!(
        std::fs::read_to_string(sb.path("app/package.json")).unwrap(),
        "{\"name\":\"new\"}"
    );
    assert!(sb.path("app/src/index.ts").is_file());

    // the checkpoint taken before clearing brings the old tree back
    api.restore_checkpoint(out.checkpoint_id.as_deref().unwrap())
        .unwrap();
    assert_eq!(tree(&sb.path("app")), before);
}

#[test]
fn confirmation_alone_does_not_imply_replace() {
    let sb = Sandbox::new();
    sb.write("app/a.txt", "A");
    let (api, _facts, _audit) = sb.api();
    let ctx = sb
        .ctx("replace-2", plan(vec![PlanItem::file("a.txt", "new")]), "app")
        .with_replace_confirmed(true);
    let out = api.apply(&ctx);
    assert!(out.needs_input);
    assert_eq!(
        out.decision.unwrap().decision_type,
        DecisionType::ScaffoldConflict
    );
    assert_eq!(std::fs::read_to_string(sb.path("app/a.txt")).unwrap(), "A");
}

#[test]
fn confirmed_replace_clears_harmless_entries_too() {
    let sb = Sandbox::new();
    sb.write("app/.gitignore", "target\n");
    sb.write("app/main.rs", "old");
    let (api, _facts, _audit) = sb.api();
    let ctx = sb
        .ctx("replace-3", plan(vec![PlanItem::file("main.rs", "new")]), "app")
        .with_conflict_mode(ConflictAction::ReplaceAll)
        .with_replace_confirmed(true);
    let out = api.apply(&ctx);
    assert!(out.ok, "{out:?}");
    let t = tree(&sb.path("app"));
    assert_eq!(t.len(), 1, "{t:?}");
    assert_eq!(t["main.rs"], Some(b"new".to_vec()));
}
