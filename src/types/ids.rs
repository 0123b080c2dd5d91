//! Identifiers for plans, checkpoints, and events.
//!
//! Plan ids are deterministic UUIDv5 values derived from a stable tag
//! (`NS_TAG`) so the same plan always hashes to the same id. Checkpoint and
//! event ids are random UUIDv4 values.
use uuid::Uuid;

use super::plan::{Plan, PlanItem};
use crate::constants::{CHECKPOINT_ID_PREFIX, NS_TAG};

/// Internal: return the UUID namespace used for deterministic IDs.
fn namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, NS_TAG.as_bytes())
}

/// Serialize a plan item into a stable string used for UUIDv5 input.
fn serialize_item(item: &PlanItem) -> String {
    match item {
        PlanItem::Dir { path } => format!("D:{path}"),
        PlanItem::File {
            path,
            content,
            executable,
        } => {
            let x = if *executable { "x" } else { "-" };
            format!("F{x}:{path}:{}:{content}", content.len())
        }
    }
}

/// Compute a deterministic UUIDv5 for a plan by serializing items in order.
#[must_use]
pub fn plan_id(plan: &Plan) -> Uuid {
    let mut s = String::new();
    for item in &plan.items {
        s.push_str(&serialize_item(item));
        s.push('\n');
    }
    Uuid::new_v5(&namespace(), s.as_bytes())
}

#[must_use]
pub fn new_checkpoint_id() -> String {
    format!("{CHECKPOINT_ID_PREFIX}{}", Uuid::new_v4().simple())
}

#[must_use]
pub fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}
