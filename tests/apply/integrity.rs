use log::Level;

use groundwork::api::errors::ApiError;
use groundwork::types::PlanItem;

use crate::common::{plan, Sandbox};

#[test]
fn integrity_tracks_edits_and_deletions() {
    let sb = Sandbox::new();
    let (api, _facts, audit) = sb.api();
    let out = api.apply(&sb.ctx(
        "integrity-1",
        plan(vec![
            PlanItem::file("a.txt", "A"),
            PlanItem::file("src/b.txt", "B"),
        ]),
        "app",
    ));
    assert!(out.ok, "{out:?}");

    let report = api.validate_integrity("integrity-1").unwrap();
    assert!(report.valid);
    assert!(report.missing_files.is_empty() && report.hash_mismatches.is_empty());

    sb.write("app/a.txt", "edited");
    let report = api.validate_integrity("integrity-1").unwrap();
    assert!(!report.valid);
    assert_eq!(report.hash_mismatches, vec!["a.txt"]);

    std::fs::remove_file(sb.path("app/src/b.txt")).unwrap();
    let report = api.validate_integrity("integrity-1").unwrap();
    assert_eq!(report.missing_files, vec!["src/b.txt"]);
    assert!(audit.has(Level::Warn, "integrity-1"));

    // read-only: nothing is repaired
    assert_eq!(std::fs::read_to_string(sb.path("app/a.txt")).unwrap(), "edited");
}

#[test]
fn integrity_of_unknown_scaffold_is_not_found() {
    let sb = Sandbox::new();
    let (api, _facts, _audit) = sb.api();
    assert!(matches!(
        api.validate_integrity("never-applied"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn prune_keeps_newest_checkpoints() {
    let sb = Sandbox::new();
    let mut policy = sb.policy();
    policy.retention.checkpoint_count_limit = Some(2);
    let (api, _facts, _audit) = sb.api_with(policy);
    for n in 0..4 {
        let out = api.apply(&sb.ctx(
            &format!("prune-{n}"),
            plan(vec![PlanItem::file("a", "1")]),
            &format!("app-{n}"),
        ));
        assert!(out.ok, "{out:?}");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(api.checkpoints().list().unwrap().len(), 4);
    let res = api.prune_checkpoints().unwrap();
    assert_eq!(res.pruned_count, 2);
    assert_eq!(res.retained_count, 2);
    let kept: Vec<Option<String>> = api
        .checkpoints()
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.scaffold_id)
        .collect();
    assert_eq!(kept, vec![Some("prune-2".to_string()), Some("prune-3".to_string())]);
}
