//! Progression operation errors.

use milestones_domain::ProgressionId;

use crate::use_cases::context::ContextError;
use crate::use_cases::error_code::ErrorCode;
use crate::use_cases::sanitize::PortFailure;

/// Errors that can occur during progression operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("progression not found")]
    NotFound(String),
    #[error("progression not available to purchase")]
    NotAvailableForPurchase(ProgressionId),
    #[error("progression not available to update")]
    NotAvailableForUpdate(ProgressionId),
    #[error("progression no cost associated")]
    NoCostAssociated(ProgressionId),
    #[error("progression no count associated")]
    NoCountAssociated {
        progression_id: ProgressionId,
        counter: String,
    },
    #[error("progression already unlocked")]
    AlreadyUnlocked(ProgressionId),
    #[error("progression preconditions not met")]
    PreconditionNotMet(ProgressionId),
    #[error("progression state was modified concurrently")]
    StoreConflict,
    #[error("insufficient funds: '{currency}' requires {required}, balance is {available}")]
    InsufficientFunds {
        currency: String,
        required: i64,
        available: i64,
    },
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("progression service unavailable")]
    Unavailable,
}

impl ProgressionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::NotAvailableForPurchase(_)
            | Self::NotAvailableForUpdate(_)
            | Self::NoCostAssociated(_)
            | Self::NoCountAssociated { .. }
            | Self::AlreadyUnlocked(_) => ErrorCode::InvalidArgument,
            Self::PreconditionNotMet(_)
            | Self::InsufficientFunds { .. } => ErrorCode::FailedPrecondition,
            Self::StoreConflict => ErrorCode::Aborted,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            Self::Unavailable => ErrorCode::Unavailable,
        }
    }
}

impl From<ContextError> for ProgressionError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl From<PortFailure> for ProgressionError {
    fn from(failure: PortFailure) -> Self {
        match failure {
            PortFailure::Conflict => Self::StoreConflict,
            PortFailure::InsufficientFunds {
                currency,
                required,
                available,
            } => Self::InsufficientFunds {
                currency,
                required,
                available,
            },
            PortFailure::Unavailable => Self::Unavailable,
        }
    }
}
