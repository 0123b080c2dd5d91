#![forbid(unsafe_code)]
//! Groundwork: safe, atomic, idempotent materialization of scaffold plans.
//!
//! Safety model highlights:
//! - A manifest per `scaffold_id` is published at most once and gates every re-run.
//! - Destructive `replace_all` needs two separate decisions before anything is deleted.
//! - The target is checkpointed (or staged in a sibling directory) before mutation and
//!   restored on any write or manifest failure.
//! - Files are written via temp file + `renameat` + directory fsync using `rustix`.

pub mod adapters;
pub mod api;
pub mod checkpoint;
pub mod conflict;
pub mod constants;
pub mod decision;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod policy;
pub mod types;

pub use api::*;
pub use decision::{apply_selections, DecisionError};
