use thiserror::Error;

use crate::types::StageId;

/// Rejections surfaced by working-set operations.
///
/// Degenerate drag gestures are not errors; they resolve to
/// [`MoveOutcome::Ignored`](super::MoveOutcome::Ignored) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("draft stage '{0}' already exists")]
    DraftAlreadyExists(StageId),

    #[error("no draft stage in this session")]
    NoDraftStage,

    #[error("merge session has already ended")]
    SessionEnded,

    #[error("a description conflict is awaiting a decision")]
    ConflictPending,

    #[error("commit summary is open")]
    CommitInProgress,

    #[error("commit was not requested")]
    CommitNotRequested,
}
