use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::conflict::ConflictAction;

/// Which question a decision request asks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    ScaffoldConflict,
    ScaffoldReplaceConfirm,
}

impl DecisionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionType::ScaffoldConflict => "scaffold_conflict",
            DecisionType::ScaffoldReplaceConfirm => "scaffold_replace_confirm",
        }
    }
}

/// Context change declared by an option; merged into `ApplyContext` by the reducer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_mode: Option<ConflictAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_confirmed: Option<bool>,
}

impl Modification {
    pub fn is_empty(&self) -> bool {
        self.target_dir.is_none() && self.merge_mode.is_none() && self.replace_confirmed.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub label: String,
    pub description: String,
    pub action: ConflictAction,
    #[serde(default, skip_serializing_if = "Modification::is_empty")]
    pub modification: Modification,
}

/// Structured question handed to a UI collaborator when input is needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub check_id: String,
    pub decision_type: DecisionType,
    pub title: String,
    pub target_directory: PathBuf,
    pub options: Vec<DecisionOption>,
    pub default_option: String,
}

impl DecisionRequest {
    pub fn option(&self, option_id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// One human choice: `option_id` picked for the request identified by `check_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub check_id: String,
    pub option_id: String,
}

impl Selection {
    pub fn new(check_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            option_id: option_id.into(),
        }
    }
}
