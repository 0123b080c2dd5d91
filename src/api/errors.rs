use thiserror::Error;

use crate::decision::DecisionError;

/// Errors returned by the facade's non-apply operations. `apply` itself never
/// fails with this type; it reports through `ApplyOutcome`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy violation: {0}")]
    PolicyViolation(String),
    #[error("filesystem error: {0}")]
    FilesystemError(String),
    #[error("malformed document: {0}")]
    Serialization(String),
    #[error("restore failed: {0}")]
    RestoreFailed(String),
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

impl From<crate::types::errors::Error> for ApiError {
    fn from(e: crate::types::errors::Error) -> Self {
        use crate::types::errors::ErrorKind::{InvalidPath, Io, NotFound, Policy, Serialize};
        match e.kind {
            InvalidPath => ApiError::InvalidInput(e.msg),
            Io => ApiError::FilesystemError(e.msg),
            NotFound => ApiError::NotFound(e.msg),
            Policy => ApiError::PolicyViolation(e.msg),
            Serialize => ApiError::Serialization(e.msg),
        }
    }
}

// Stable identifiers; SCREAMING_SNAKE_CASE matches the emitted ids.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorId {
    E_REPLAY,
    E_CANCELLED,
    E_INVALID_PLAN,
    E_LOCKING,
    E_CHECKPOINT,
    E_WRITE,
    E_MANIFEST,
    E_RESTORE_FAILED,
    E_GENERIC,
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_REPLAY => "E_REPLAY",
        ErrorId::E_CANCELLED => "E_CANCELLED",
        ErrorId::E_INVALID_PLAN => "E_INVALID_PLAN",
        ErrorId::E_LOCKING => "E_LOCKING",
        ErrorId::E_CHECKPOINT => "E_CHECKPOINT",
        ErrorId::E_WRITE => "E_WRITE",
        ErrorId::E_MANIFEST => "E_MANIFEST",
        ErrorId::E_RESTORE_FAILED => "E_RESTORE_FAILED",
        ErrorId::E_GENERIC => "E_GENERIC",
    }
}

#[must_use]
pub const fn exit_code_for(id: ErrorId) -> i32 {
    match id {
        ErrorId::E_REPLAY => 10,
        ErrorId::E_CANCELLED => 11,
        ErrorId::E_INVALID_PLAN => 12,
        ErrorId::E_LOCKING => 30,
        ErrorId::E_CHECKPOINT => 40,
        ErrorId::E_WRITE => 50,
        ErrorId::E_MANIFEST => 60,
        ErrorId::E_RESTORE_FAILED => 70,
        ErrorId::E_GENERIC => 1,
    }
}

#[must_use]
pub fn exit_code_for_id_str(s: &str) -> Option<i32> {
    [
        ErrorId::E_REPLAY,
        ErrorId::E_CANCELLED,
        ErrorId::E_INVALID_PLAN,
        ErrorId::E_LOCKING,
        ErrorId::E_CHECKPOINT,
        ErrorId::E_WRITE,
        ErrorId::E_MANIFEST,
        ErrorId::E_RESTORE_FAILED,
        ErrorId::E_GENERIC,
    ]
    .into_iter()
    .find(|id| id_str(*id) == s)
    .map(exit_code_for)
}
