//! Tutorial operation errors.

use milestones_domain::TutorialId;

use crate::use_cases::context::ContextError;
use crate::use_cases::error_code::ErrorCode;
use crate::use_cases::sanitize::PortFailure;

/// Errors that can occur during tutorial operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TutorialError {
    #[error("tutorial not found")]
    NotFound(String),
    #[error("tutorial not available to update")]
    NotAvailableForUpdate(TutorialId),
    #[error("tutorial state was modified concurrently")]
    StoreConflict,
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("tutorial service unavailable")]
    Unavailable,
}

impl TutorialError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::NotAvailableForUpdate(_) => ErrorCode::FailedPrecondition,
            Self::StoreConflict => ErrorCode::Aborted,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            Self::Unavailable => ErrorCode::Unavailable,
        }
    }
}

impl From<ContextError> for TutorialError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl From<PortFailure> for TutorialError {
    fn from(failure: PortFailure) -> Self {
        match failure {
            PortFailure::Conflict => Self::StoreConflict,
            // Tutorial stores never see wallet errors.
            PortFailure::InsufficientFunds { .. } | PortFailure::Unavailable => Self::Unavailable,
        }
    }
}
