use groundwork::policy::StagingPolicy;
use groundwork::types::{ApplyStrategy, PlanItem};
use groundwork::Groundwork;

use crate::common::{plan, FailOn, Sandbox, TestAudit, TestEmitter};

fn staging_leftovers(sb: &Sandbox) -> Vec<String> {
    std::fs::read_dir(&sb.ws)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(".groundwork-staging."))
        .collect()
}

fn staging_api(sb: &Sandbox) -> (Groundwork<TestEmitter, TestAudit>, TestEmitter) {
    let mut policy = sb.policy();
    policy.apply.staging = StagingPolicy::WhenTargetAbsent;
    let (api, facts, _audit) = sb.api_with(policy);
    (api, facts)
}

#[test]
fn fresh_target_is_staged_and_renamed_into_place() {
    let sb = Sandbox::new();
    let (api, facts) = staging_api(&sb);
    let out = api.apply(&sb.ctx(
        "stage-1",
        plan(vec![PlanItem::dir("src"), PlanItem::file("src/lib.rs", "")]),
        "app",
    ));
    assert!(out.ok, "{out:?}");
    assert!(out.checkpoint_id.is_none());
    assert!(sb.path("app/src/lib.rs").is_file());
    assert!(staging_leftovers(&sb).is_empty());

    let manifest = api.load_manifest("stage-1").unwrap().unwrap();
    assert_eq!(manifest.strategy, ApplyStrategy::TempStaging);
    assert!(facts.of_type("checkpoint_created").is_empty());
    assert_eq!(
        facts.of_type("scaffold_applied")[0]["payload"]["strategy"],
        "temp_staging"
    );
}

#[test]
fn existing_target_still_uses_a_checkpoint() {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.path("app")).unwrap();
    let (api, _facts) = staging_api(&sb);
    let out = api.apply(&sb.ctx("stage-2", plan(vec![PlanItem::file("a", "1")]), "app"));
    assert!(out.ok, "{out:?}");
    assert!(out.checkpoint_id.is_some());
}

#[test]
fn staged_failure_leaves_neither_target_nor_staging() {
    let sb = Sandbox::new();
    let (api, facts) = staging_api(&sb);
    let api = api.with_writer(FailOn::boxed("b.txt"));
    let out = api.apply(&sb.ctx(
        "stage-3",
        plan(vec![PlanItem::file("a.txt", "A"), PlanItem::file("b.txt", "B")]),
        "app",
    ));
    assert!(!out.ok);
    assert!(out.rolled_back);
    assert!(out.rollback_errors.is_empty());
    assert!(!sb.path("app").exists());
    assert!(staging_leftovers(&sb).is_empty());
    assert!(facts.of_type("checkpoint_restored").is_empty());
}
