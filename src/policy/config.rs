use std::path::Path;

use super::types::{
    ApplyFlow, Conflicts, Durability, Governance, LockingPolicy, Retention, StagingPolicy, Stores,
};

/// Policy governs conflict detection, store locations, locking, and durability.
///
/// Grouped fields provide clearer ownership and ergonomics.
#[derive(Clone, Debug, Default)]
pub struct Policy {
    pub conflicts: Conflicts,
    pub stores: Stores,
    pub governance: Governance,
    pub durability: Durability,
    pub apply: ApplyFlow,
    pub retention: Retention,
}

impl Policy {
    /// Default policy with both stores placed under `state_dir`.
    #[must_use]
    pub fn with_state_dir(state_dir: &Path) -> Self {
        Self {
            stores: Stores::under(state_dir),
            ..Self::default()
        }
    }

    /// Hardened settings for shared machines:
    /// - `governance.locking = Required` (apply refuses to run without a `LockManager`)
    /// - `durability.fsync = true`
    /// - `apply.staging = WhenTargetAbsent` (fresh targets appear in one rename)
    ///
    /// # Example
    /// ```rust
    /// use groundwork::policy::Policy;
    /// use groundwork::{Groundwork, logging::NoopSink};
    /// use groundwork::adapters::FileLockManager;
    ///
    /// let state = std::env::temp_dir().join("groundwork-doc");
    /// let policy = Policy::strict_preset(&state);
    /// let api = Groundwork::new(NoopSink, NoopSink, policy)
    ///     .with_lock_manager(Box::new(FileLockManager::new(state.join("apply.lock"))));
    /// # let _ = api;
    /// ```
    #[must_use]
    pub fn strict_preset(state_dir: &Path) -> Self {
        let mut p = Self::with_state_dir(state_dir);
        p.governance.locking = LockingPolicy::Required;
        p.durability.fsync = true;
        p.apply.staging = StagingPolicy::WhenTargetAbsent;
        p
    }

    /// Settings for tests and throwaway sandboxes: no fsync.
    #[must_use]
    pub fn sandbox(state_dir: &Path) -> Self {
        let mut p = Self::with_state_dir(state_dir);
        p.durability.fsync = false;
        p
    }
}
