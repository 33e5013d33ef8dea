//! Port failure logging.
//!
//! Store and wallet errors are logged in full here and then collapsed into a
//! detail-free error kind, so internal messages never reach callers.

use crate::infrastructure::ports::{RepoError, WalletError};

/// How a port failure surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PortFailure {
    Conflict,
    InsufficientFunds {
        currency: String,
        required: i64,
        available: i64,
    },
    Unavailable,
}

pub(crate) fn repo_failure(error: RepoError, operation: &'static str) -> PortFailure {
    if error.is_conflict() {
        tracing::warn!(error = %error, operation = operation, "Store version conflict");
        return PortFailure::Conflict;
    }
    tracing::error!(error = %error, operation = operation, "Store error");
    PortFailure::Unavailable
}

pub(crate) fn wallet_failure(error: WalletError) -> PortFailure {
    match error {
        WalletError::InsufficientFunds {
            currency,
            required,
            available,
        } => PortFailure::InsufficientFunds {
            currency,
            required,
            available,
        },
        other => {
            tracing::error!(error = %other, operation = "charge", "Wallet error");
            PortFailure::Unavailable
        }
    }
}
