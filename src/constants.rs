//! Shared crate-wide constants for groundwork.
//!
//! Centralizes magic values and default labels used across modules.
//! Adjusting these here will propagate through the crate.

/// Filename prefix for apply manifests. The full name is
/// `scaffold_apply_<scaffold_id>.json` inside the manifest directory.
pub const MANIFEST_PREFIX: &str = "scaffold_apply_";

/// Extension used for every evidence document (manifests and checkpoints).
pub const DOC_EXT: &str = "json";

/// Default sub-directory (under a caller-chosen state dir) holding manifests.
pub const MANIFEST_SUBDIR: &str = "manifests";

/// Default sub-directory (under a caller-chosen state dir) holding checkpoints.
pub const CHECKPOINT_SUBDIR: &str = "checkpoints";

/// Prefix for generated checkpoint ids: `ckpt_<uuid-simple>`.
pub const CHECKPOINT_ID_PREFIX: &str = "ckpt_";

/// Temporary filename suffix used for atomic write staging within a directory.
/// The temporary name is constructed as `.{fname}.{pid}.{ctr}{TMP_SUFFIX}`.
pub const TMP_SUFFIX: &str = ".groundwork.tmp";

/// Infix for the sibling staging directory used by the `temp_staging` strategy:
/// `.{target_name}{STAGING_INFIX}{uuid}`.
pub const STAGING_INFIX: &str = ".groundwork-staging.";

/// Poll interval in milliseconds for the file-backed lock manager (see `adapters/lock/file.rs`).
pub const LOCK_POLL_MS: u64 = 25;

/// Default lock timeout used by `Groundwork::new()` unless overridden by `with_lock_timeout_ms()`.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// UUIDv5 namespace tag for deterministic plan ids.
pub const NS_TAG: &str = "https://groundwork.dev/scaffold-apply";

/// Envelope schema version stamped on every emitted domain event.
pub const EVENT_SCHEMA_VERSION: i64 = 1;

/// Schema version stamped on manifests and checkpoints.
pub const DOC_SCHEMA_VERSION: u32 = 1;

/// Subsystem label passed to `FactsEmitter::emit`.
pub const SUBSYSTEM: &str = "scaffold";

/// File mode applied to plan files flagged `executable`.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// File mode applied to regular plan files.
pub const REGULAR_MODE: u32 = 0o644;

/// Entry names that never make a target directory count as "not empty":
/// VCS metadata and editor/OS droppings.
pub const HARMLESS_ENTRIES: &[&str] = &[
    ".git",
    ".gitignore",
    ".gitattributes",
    ".hg",
    ".DS_Store",
    "Thumbs.db",
    ".idea",
    ".vscode",
];

/// Upper bound on `<target>-N` probing when suggesting an alternative directory.
pub const MAX_ALT_DIR_PROBES: u32 = 100;
