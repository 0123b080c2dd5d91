use serial_test::serial;

use groundwork::adapters::{FileLockManager, LockManager};
use groundwork::types::PlanItem;

use crate::common::{plan, Sandbox};

#[test]
#[serial]
fn held_file_lock_blocks_apply_until_released() {
    let sb = Sandbox::new();
    let lock_path = sb.td.path().join("locks/apply.lock");
    let (api, facts, _audit) = sb.api();
    let api = api
        .with_lock_manager(Box::new(FileLockManager::new(lock_path.clone())))
        .with_lock_timeout_ms(100);
    let ctx = sb.ctx("contend-1", plan(vec![PlanItem::file("a", "1")]), "app");

    let holder = FileLockManager::new(lock_path);
    let guard = holder.acquire_process_lock(100).unwrap();
    let blocked = api.apply(&ctx);
    assert_eq!(blocked.error_id.as_deref(), Some("E_LOCKING"), "{blocked:?}");
    assert!(!sb.path("app").exists());
    assert!(!api.was_applied("contend-1").unwrap());

    drop(guard);
    let out = api.apply(&ctx);
    assert!(out.ok, "{out:?}");
    let applied = &facts.of_type("scaffold_applied")[0];
    assert_eq!(applied["payload"]["lock_backend"], "file");
}
