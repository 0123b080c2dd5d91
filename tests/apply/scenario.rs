use std::os::unix::fs::PermissionsExt;

use groundwork::types::{ApplyStrategy, PlanItem};

use crate::common::{plan, sha256_of, Sandbox};

#[test]
fn fresh_target_gets_every_file_and_a_manifest() {
    let sb = Sandbox::new();
    let (api, facts, _audit) = sb.api();
    let ctx = sb.ctx(
        "scenario-1",
        plan(vec![
            PlanItem::dir("src"),
            PlanItem::file("src/a.ts", "x"),
            PlanItem::file("pkg.json", "{}"),
        ]),
        "app",
    );

    let out = api.apply(&ctx);
    assert!(out.ok, "{out:?}");
    assert!(!out.needs_input);
    assert_eq!(out.created_files, vec!["src/a.ts", "pkg.json"]);
    assert_eq!(out.created_dirs, vec!["src"]);
    assert!(out.checkpoint_id.is_some());

    let manifest = api.load_manifest("scenario-1").unwrap().unwrap();
    assert_eq!(Some(sb.state.join("manifests/scaffold_apply_scenario-1.json")), out.manifest_ref);
    assert_eq!(manifest.files.len(), 2);
    assert_eq!(manifest.strategy, ApplyStrategy::Checkpoint);
    assert_eq!(manifest.checkpoint_id, out.checkpoint_id);
    for f in &manifest.files {
        let on_disk = sb.path("app").join(&f.path);
        assert_eq!(sha256_of(&on_disk), f.sha256, "{}", f.path);
        assert_eq!(std::fs::read(&on_disk).unwrap().len() as u64, f.bytes);
    }

    assert_eq!(
        facts.names(),
        vec!["scaffold_apply_started", "checkpoint_created", "scaffold_applied"]
    );
    let applied = &facts.of_type("scaffold_applied")[0];
    assert_eq!(applied["scaffold_id"], "scenario-1");
    assert_eq!(applied["payload"]["files_created"][1], "pkg.json");
}

#[test]
fn executable_items_get_exec_mode_recorded() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    let ctx = sb.ctx(
        "exec-1",
        plan(vec![
            PlanItem::executable("bin/dev", "#!/bin/sh\necho dev\n"),
            PlanItem::file("README.md", "# app\n"),
        ]),
        "app",
    );
    let out = api.apply(&ctx);
    assert!(out.ok, "{out:?}");
    let mode = std::fs::metadata(sb.path("app/bin/dev")).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);

    let manifest = api.load_manifest("exec-1").unwrap().unwrap();
    assert_eq!(manifest.files[0].mode.as_deref(), Some("755"));
    assert_eq!(manifest.files[1].mode, None);
    assert_eq!(manifest.dirs, vec!["bin"]);
}

#[test]
fn existing_empty_directory_is_not_a_conflict() {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.path("app/.git")).unwrap();
    let (api, facts, _audit) = sb.api();
    let out = api.apply(&sb.ctx("empty-1", plan(vec![PlanItem::file("a", "1")]), "app"));
    assert!(out.ok, "{out:?}");
    assert!(facts.of_type("scaffold_conflict_detected").is_empty());
    assert!(sb.path("app/.git").is_dir());
}
