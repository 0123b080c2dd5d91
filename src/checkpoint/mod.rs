//! Pre-mutation snapshots of a target directory.
//!
//! A checkpoint is one JSON document (`<checkpoint_id>.json`) holding every
//! directory, file, and symlink under the target. Restoring replays it over
//! whatever the failed apply left behind.

pub mod store;

pub use store::CheckpointStore;
