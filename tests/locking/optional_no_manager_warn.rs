use log::Level;

use groundwork::types::PlanItem;

use crate::common::{plan, Sandbox};

#[test]
fn optional_locking_without_manager_warns_and_proceeds() {
    let sb = Sandbox::new();
    let (api, facts, audit) = sb.api();
    let out = api.apply(&sb.ctx("warn-1", plan(vec![PlanItem::file("a", "1")]), "app"));
    assert!(out.ok, "{out:?}");
    assert!(audit.has(Level::Warn, "no lock manager"));
    let applied = &facts.of_type("scaffold_applied")[0];
    assert_eq!(applied["payload"]["lock_backend"], "none");
}
