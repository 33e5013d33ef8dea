//! Error types for port operations.

use milestones_domain::UserId;

/// Per-user store errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Optimistic concurrency check failed: someone else saved first.
    #[error("Version conflict for user {user_id}: expected {expected}, found {actual}")]
    Conflict {
        user_id: UserId,
        expected: u64,
        actual: u64,
    },

    /// Storage operation failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    pub fn conflict(user_id: &UserId, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            user_id: user_id.clone(),
            expected,
            actual,
        }
    }

    /// Create a Storage error with operation context.
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Economy/wallet errors.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Insufficient funds: '{currency}' requires {required}, balance is {available}")]
    InsufficientFunds {
        currency: String,
        required: i64,
        available: i64,
    },

    #[error("Wallet unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_reports_versions() {
        let user = UserId::new("user-1").unwrap();
        let err = RepoError::conflict(&user, 3, 4);
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Version conflict for user user-1: expected 3, found 4"
        );
    }

    #[test]
    fn storage_error_includes_operation() {
        let err = RepoError::storage("save", "disk full");
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "Storage error in save: disk full");
    }
}
