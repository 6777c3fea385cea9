#![forbid(unsafe_code)]

use crate::ids::ItemId;
use crate::model::Status;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
    #[error("item {id} cannot be quick-received: {reason}")]
    QuickReceiveNotEligible { id: ItemId, reason: &'static str },
    #[error("item {id} is not awaiting receipt (status={status})")]
    NotReceivable { id: ItemId, status: Status },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("undo window expired")]
    UndoExpired,
    #[error("malformed item: {0}")]
    Malformed(String),
}

impl BoardError {
    /// Stable machine-readable code for response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::UnknownItem(_) => "UNKNOWN_ID",
            Self::QuickReceiveNotEligible { .. } | Self::NotReceivable { .. } => "NOT_ELIGIBLE",
            Self::NothingToUndo | Self::UndoExpired => "UNDO_UNAVAILABLE",
            Self::Malformed(_) => "INVALID_INPUT",
        }
    }
}
