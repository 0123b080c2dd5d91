use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::conflict::ConflictAction;
use super::plan::Plan;

/// Per-invocation input. Owned by the caller and threaded through re-invocations;
/// the engine keeps no state between calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyContext {
    pub scaffold_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    pub plan: Plan,
    pub workspace_root: PathBuf,
    pub target_directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_mode: Option<ConflictAction>,
    #[serde(default)]
    pub replace_confirmed: bool,
    #[serde(default)]
    pub is_replay: bool,
}

impl ApplyContext {
    pub fn new(
        scaffold_id: impl Into<String>,
        plan: Plan,
        workspace_root: impl Into<PathBuf>,
        target_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scaffold_id: scaffold_id.into(),
            recipe_id: None,
            plan,
            workspace_root: workspace_root.into(),
            target_directory: target_directory.into(),
            conflict_mode: None,
            replace_confirmed: false,
            is_replay: false,
        }
    }

    #[must_use]
    pub fn with_recipe_id(mut self, recipe_id: impl Into<String>) -> Self {
        self.recipe_id = Some(recipe_id.into());
        self
    }

    #[must_use]
    pub fn with_conflict_mode(mut self, mode: ConflictAction) -> Self {
        self.conflict_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_replace_confirmed(mut self, confirmed: bool) -> Self {
        self.replace_confirmed = confirmed;
        self
    }

    #[must_use]
    pub fn as_replay(mut self) -> Self {
        self.is_replay = true;
        self
    }
}
