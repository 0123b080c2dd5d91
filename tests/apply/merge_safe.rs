use groundwork::types::{ConflictAction, ConflictReason, DecisionType, PlanItem};

use crate::common::{plan, Sandbox};

#[test]
fn merge_safe_only_never_overwrites() {
    let sb = Sandbox::new();
    sb.write("app/package.json", "{\"name\":\"mine\"}");
    let (api, facts, _audit) = sb.api();
    let items = plan(vec![
        PlanItem::file("package.json", "{\"name\":\"template\"}"),
        PlanItem::file("src/index.ts", "export {}\n"),
    ]);

    let first = api.apply(&sb.ctx("merge-1", items.clone(), "app"));
    assert!(first.needs_input);
    let request = first.decision.unwrap();
    assert_eq!(request.decision_type, DecisionType::ScaffoldConflict);
    let ids: Vec<&str> = request.options.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["choose_new_dir", "merge_safe_only", "replace_all", "cancel"]
    );
    let pending = first.pending_conflict.unwrap();
    assert_eq!(pending.conflicts[0].reason, ConflictReason::DirNotEmpty);
    assert!(pending
        .conflicts
        .iter()
        .any(|c| c.reason == ConflictReason::Exists && c.path == "package.json"));
    assert_eq!(pending.suggested_dir, Some(sb.path("app-2")));

    let out = api.apply(
        &sb.ctx("merge-1", items, "app")
            .with_conflict_mode(ConflictAction::MergeSafeOnly),
    );
    assert!(out.ok, "{out:?}");
    assert_eq!(out.skipped_files, vec!["package.json"]);
    assert_eq!(out.created_files, vec!["src/index.ts"]);
    assert_eq!(
        std::fs::read_to_string(sb.path("app/package.json")).unwrap(),
        "{\"name\":\"mine\"}"
    );
    assert!(sb.path("app/src/index.ts").is_file());

    let manifest = api.load_manifest("merge-1").unwrap().unwrap();
    assert_eq!(manifest.skipped_files, vec!["package.json"]);
    assert_eq!(manifest.files.len(), 1);
    let applied = &facts.of_type("scaffold_applied")[0];
    assert_eq!(applied["payload"]["skipped_files"][0], "package.json");
}

#[test]
fn detect_conflicts_is_read_only() {
    let sb = Sandbox::new();
    sb.write("app/README.md", "hi");
    let (api, facts, _audit) = sb.api();
    let ctx = sb.ctx("merge-2", plan(vec![PlanItem::file("README.md", "x")]), "app");
    let res = api.detect_conflicts(&ctx).unwrap();
    assert!(res.has_conflicts);
    assert_eq!(res.default_action, ConflictAction::ChooseNewDir);
    assert_eq!(facts.len(), 0);
    assert!(!sb.state.exists());
}
