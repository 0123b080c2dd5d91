use std::path::Path;

use crate::decision::{conflict_request, replace_confirm_request};
use crate::types::{ApplyContext, ConflictAction, ConflictCheckResult, DecisionRequest};

/// How the write stage treats existing content once the gate lets it through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Nothing conflicts; write every plan file.
    Clean,
    /// Write only files that do not exist yet.
    MergeSafeOnly,
    /// Clear the target (after the checkpoint) and write everything.
    ReplaceAll,
}

pub(crate) enum Gate {
    Proceed(WriteMode),
    NeedsDecision(DecisionRequest),
    Cancelled,
}

/// Decide whether an apply may reach `CHECKPOINT`.
///
/// Cancel always wins. Otherwise a conflicted target needs a mode the
/// detector actually offered; `choose_new_dir` needs a re-invocation with a
/// new target, and `replace_all` needs a separate confirmation.
pub(crate) fn evaluate(ctx: &ApplyContext, target: &Path, result: &ConflictCheckResult) -> Gate {
    if ctx.conflict_mode == Some(ConflictAction::Cancel) {
        return Gate::Cancelled;
    }
    if !result.has_conflicts {
        return Gate::Proceed(WriteMode::Clean);
    }
    let ask = || Gate::NeedsDecision(conflict_request(ctx, target, result));
    match ctx.conflict_mode {
        None => ask(),
        Some(mode) if !result.offers(mode) => ask(),
        Some(ConflictAction::ChooseNewDir | ConflictAction::Cancel) => ask(),
        Some(ConflictAction::MergeSafeOnly) => Gate::Proceed(WriteMode::MergeSafeOnly),
        Some(ConflictAction::ReplaceAll) if !ctx.replace_confirmed => {
            Gate::NeedsDecision(replace_confirm_request(ctx, target, result))
        }
        Some(ConflictAction::ReplaceAll) => Gate::Proceed(WriteMode::ReplaceAll),
    }
}
