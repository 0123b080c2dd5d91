use std::path::{Path, PathBuf};

use crate::constants::{CHECKPOINT_SUBDIR, HARMLESS_ENTRIES, MANIFEST_SUBDIR};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockingPolicy {
    Required,
    #[default]
    Optional,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StagingPolicy {
    #[default]
    Off,
    /// Write into a sibling staging directory and rename it into place when
    /// the target does not exist yet.
    WhenTargetAbsent,
}

#[derive(Clone, Debug)]
pub struct Conflicts {
    /// Entry names ignored by the "directory not empty" check.
    pub harmless_entries: Vec<String>,
}

impl Default for Conflicts {
    fn default() -> Self {
        Self {
            harmless_entries: HARMLESS_ENTRIES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Conflicts {
    pub fn is_harmless(&self, name: &str) -> bool {
        self.harmless_entries.iter().any(|h| h == name)
    }
}

/// Where evidence documents are kept. An apply whose target contains either
/// directory is refused at precheck.
#[derive(Clone, Debug)]
pub struct Stores {
    pub manifest_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
}

impl Stores {
    pub fn under(state_dir: &Path) -> Self {
        Self {
            manifest_dir: state_dir.join(MANIFEST_SUBDIR),
            checkpoint_dir: state_dir.join(CHECKPOINT_SUBDIR),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::under(Path::new(".groundwork"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Governance {
    pub locking: LockingPolicy,
}

#[derive(Clone, Copy, Debug)]
pub struct Durability {
    /// Fsync written files and their parent directories.
    pub fsync: bool,
}

impl Default for Durability {
    fn default() -> Self {
        Self { fsync: true }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApplyFlow {
    pub staging: StagingPolicy,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Retention {
    /// Checkpoints kept by `prune_checkpoints`; `None` disables pruning.
    pub checkpoint_count_limit: Option<usize>,
}
