use std::time::Instant;

use log::Level;

use crate::adapters::lock::LockGuard;
use crate::api::errors::ErrorId;
use crate::api::Groundwork;
use crate::logging::{AuditSink, FactsEmitter};
use crate::policy::LockingPolicy;

pub(crate) struct LockInfo {
    pub backend: &'static str,
    pub wait_ms: Option<u64>,
    pub guard: Option<Box<dyn LockGuard>>,
}

pub(crate) struct LockFailure {
    pub id: ErrorId,
    pub msg: String,
}

/// Take the advisory lock, if one is configured.
///
/// Without a manager the apply is unguarded against concurrent invocations on
/// the same target: allowed (with a warning) under `Optional`, refused under
/// `Required`.
pub(crate) fn acquire<E: FactsEmitter, A: AuditSink>(
    api: &Groundwork<E, A>,
) -> Result<LockInfo, LockFailure> {
    let Some(mgr) = &api.lock else {
        if api.policy.governance.locking == LockingPolicy::Required {
            api.audit
                .log(Level::Error, "apply: lock manager required by policy (E_LOCKING)");
            return Err(LockFailure {
                id: ErrorId::E_LOCKING,
                msg: "lock manager required by policy but none configured".to_string(),
            });
        }
        api.audit.log(
            Level::Warn,
            "apply: no lock manager; concurrent applies on the same target are not serialized",
        );
        return Ok(LockInfo {
            backend: "none",
            wait_ms: None,
            guard: None,
        });
    };
    let t0 = Instant::now();
    match mgr.acquire_process_lock(api.lock_timeout_ms) {
        Ok(guard) => Ok(LockInfo {
            backend: mgr.backend(),
            wait_ms: Some(u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX)),
            guard: Some(guard),
        }),
        Err(e) => {
            api.audit
                .log(Level::Error, "apply: lock acquisition failed (E_LOCKING)");
            Err(LockFailure {
                id: ErrorId::E_LOCKING,
                msg: e.msg,
            })
        }
    }
}
