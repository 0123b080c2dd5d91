//! Structured decision requests and the selection reducer.
//!
//! `apply` hands a [`DecisionRequest`] back whenever it needs a human. The
//! caller renders it, collects [`Selection`]s, and folds them into a new
//! [`ApplyContext`] with [`apply_selections`] before re-invoking.
use std::path::Path;

use thiserror::Error;

use crate::types::{
    ApplyContext, ApplyOutcome, ConflictAction, ConflictCheckResult, DecisionOption,
    DecisionRequest, DecisionType, Modification, Selection,
};

/// Option id of the destructive confirmation in a `scaffold_replace_confirm` request.
pub const CONFIRM_REPLACE: &str = "confirm_replace";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("no decision is pending on the prior outcome")]
    NoPendingDecision,
    #[error("unknown check id: {0}")]
    UnknownCheck(String),
    #[error("check {check_id} has no option {option_id}")]
    UnknownOption { check_id: String, option_id: String },
    /// `choose_new_dir` was selected but no free directory could be suggested;
    /// the caller has to set `target_directory` itself.
    #[error("check {0} offers no suggested directory; set target_directory explicitly")]
    NoSuggestedDir(String),
}

fn check_id(kind: DecisionType, scaffold_id: &str) -> String {
    format!("{}:{scaffold_id}", kind.as_str())
}

fn option(id: &str, label: &str, description: String, action: ConflictAction, m: Modification) -> DecisionOption {
    DecisionOption {
        id: id.to_string(),
        label: label.to_string(),
        description,
        action,
        modification: m,
    }
}

fn choose_new_dir_option(result: &ConflictCheckResult) -> DecisionOption {
    let description = match &result.suggested_dir {
        Some(d) => format!("Scaffold into {} instead", d.display()),
        None => "No free directory nearby; set another target directory".to_string(),
    };
    option(
        ConflictAction::ChooseNewDir.as_str(),
        "Use a different directory",
        description,
        ConflictAction::ChooseNewDir,
        Modification {
            target_dir: result.suggested_dir.clone(),
            ..Modification::default()
        },
    )
}

fn cancel_option() -> DecisionOption {
    option(
        ConflictAction::Cancel.as_str(),
        "Cancel",
        "Abort without touching the filesystem".to_string(),
        ConflictAction::Cancel,
        Modification::default(),
    )
}

fn merge_option() -> DecisionOption {
    option(
        ConflictAction::MergeSafeOnly.as_str(),
        "Add missing files only",
        "Keep every existing file and create only what is absent".to_string(),
        ConflictAction::MergeSafeOnly,
        Modification {
            merge_mode: Some(ConflictAction::MergeSafeOnly),
            replace_confirmed: Some(false),
            ..Modification::default()
        },
    )
}

/// Request offered when detection found conflicts and no usable mode was given.
/// Options mirror `result.suggested_actions`, in the same order.
pub fn conflict_request(ctx: &ApplyContext, target: &Path, result: &ConflictCheckResult) -> DecisionRequest {
    let options = result
        .suggested_actions
        .iter()
        .map(|action| match action {
            ConflictAction::ChooseNewDir => choose_new_dir_option(result),
            ConflictAction::MergeSafeOnly => merge_option(),
            ConflictAction::ReplaceAll => option(
                ConflictAction::ReplaceAll.as_str(),
                "Replace existing content",
                "Delete everything in the target first (asks for confirmation)".to_string(),
                ConflictAction::ReplaceAll,
                Modification {
                    merge_mode: Some(ConflictAction::ReplaceAll),
                    ..Modification::default()
                },
            ),
            ConflictAction::Cancel => cancel_option(),
        })
        .collect();
    DecisionRequest {
        check_id: check_id(DecisionType::ScaffoldConflict, &ctx.scaffold_id),
        decision_type: DecisionType::ScaffoldConflict,
        title: result.summary.clone(),
        target_directory: target.to_path_buf(),
        options,
        default_option: result.default_action.as_str().to_string(),
    }
}

/// Second, distinct request guarding `replace_all`.
pub fn replace_confirm_request(ctx: &ApplyContext, target: &Path, result: &ConflictCheckResult) -> DecisionRequest {
    let n = result.conflicts.len();
    let options = vec![
        option(
            CONFIRM_REPLACE,
            "Yes, delete and replace",
            format!(
                "Permanently delete the current contents of {} ({n} conflict{})",
                target.display(),
                if n == 1 { "" } else { "s" }
            ),
            ConflictAction::ReplaceAll,
            Modification {
                merge_mode: Some(ConflictAction::ReplaceAll),
                replace_confirmed: Some(true),
                ..Modification::default()
            },
        ),
        merge_option(),
        choose_new_dir_option(result),
        cancel_option(),
    ];
    DecisionRequest {
        check_id: check_id(DecisionType::ScaffoldReplaceConfirm, &ctx.scaffold_id),
        decision_type: DecisionType::ScaffoldReplaceConfirm,
        title: format!("Replace everything in {}?", target.display()),
        target_directory: target.to_path_buf(),
        options,
        default_option: ConflictAction::ChooseNewDir.as_str().to_string(),
    }
}

/// Fold `selections` into a copy of `ctx`.
///
/// Selections are applied in the order given; later ones win on the same
/// field. A new target directory resets the conflict mode and confirmation,
/// since those answered questions about the old target. Any cancel returns
/// `Ok(None)`, which the caller must treat as a full abort.
///
/// # Errors
///
/// Every selection is resolved before anything is applied; an unknown check
/// or option id fails the whole call, as does `choose_new_dir` when the
/// request had no directory to suggest.
pub fn apply_selections(
    ctx: &ApplyContext,
    prior: &ApplyOutcome,
    selections: &[Selection],
) -> Result<Option<ApplyContext>, DecisionError> {
    if selections.is_empty() {
        return Ok(Some(ctx.clone()));
    }
    let request = prior.decision.as_ref().ok_or(DecisionError::NoPendingDecision)?;
    let chosen = selections
        .iter()
        .map(|sel| {
            if sel.check_id != request.check_id {
                return Err(DecisionError::UnknownCheck(sel.check_id.clone()));
            }
            request
                .option(&sel.option_id)
                .ok_or_else(|| DecisionError::UnknownOption {
                    check_id: sel.check_id.clone(),
                    option_id: sel.option_id.clone(),
                })
        })
        .collect::<Result<Vec<&DecisionOption>, _>>()?;

    if chosen.iter().any(|o| o.action == ConflictAction::Cancel) {
        return Ok(None);
    }
    if chosen
        .iter()
        .any(|o| o.action == ConflictAction::ChooseNewDir && o.modification.target_dir.is_none())
    {
        return Err(DecisionError::NoSuggestedDir(request.check_id.clone()));
    }

    let mut next = ctx.clone();
    for opt in chosen {
        let m = &opt.modification;
        if let Some(dir) = &m.target_dir {
            next.target_directory.clone_from(dir);
            next.conflict_mode = None;
            next.replace_confirmed = false;
        }
        if let Some(mode) = m.merge_mode {
            next.conflict_mode = Some(mode);
        }
        if let Some(confirmed) = m.replace_confirmed {
            next.replace_confirmed = confirmed;
        }
    }
    Ok(Some(next))
}
