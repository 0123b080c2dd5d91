use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a file entry's `content` is encoded inside the checkpoint document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    #[default]
    Utf8,
    Base64,
}

fn is_utf8(e: &ContentEncoding) -> bool {
    matches!(e, ContentEncoding::Utf8)
}

/// One node of the pre-mutation tree. Paths are relative to the target directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckpointEntry {
    Dir {
        path: String,
    },
    File {
        path: String,
        content: String,
        #[serde(default, skip_serializing_if = "is_utf8")]
        encoding: ContentEncoding,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<u32>,
    },
    Symlink {
        path: String,
        dest: String,
    },
}

impl CheckpointEntry {
    pub fn path(&self) -> &str {
        match self {
            CheckpointEntry::Dir { path }
            | CheckpointEntry::File { path, .. }
            | CheckpointEntry::Symlink { path, .. } => path,
        }
    }
}

/// Full snapshot of a target directory taken before mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub schema_version: u32,
    pub id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaffold_id: Option<String>,
    pub target_directory: PathBuf,
    /// False when the target did not exist; restoring then removes it entirely.
    #[serde(default = "default_true")]
    pub target_existed: bool,
    pub entries: Vec<CheckpointEntry>,
}

fn default_true() -> bool {
    true
}

impl Checkpoint {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts reported by `CheckpointStore::prune`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub pruned_count: usize,
    pub retained_count: usize,
}
