//! Stable error classification for callers.

use serde::{Deserialize, Serialize};

/// Error classification codes shared by every use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Caller errors ===
    /// Request named something the catalog does not track for that operation
    InvalidArgument,
    /// Unknown progression or tutorial
    NotFound,
    /// Operation is not allowed in the current state
    FailedPrecondition,
    /// Lost an optimistic concurrency race; safe to retry
    Aborted,

    // === Request lifecycle ===
    Cancelled,
    DeadlineExceeded,

    // === Dependencies ===
    /// Store or wallet failed
    Unavailable,
}

impl ErrorCode {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Aborted | Self::Unavailable | Self::DeadlineExceeded)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for code in [
            ErrorCode::InvalidArgument,
            ErrorCode::NotFound,
            ErrorCode::FailedPrecondition,
            ErrorCode::Aborted,
            ErrorCode::Cancelled,
            ErrorCode::DeadlineExceeded,
            ErrorCode::Unavailable,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn only_transient_codes_are_retryable() {
        assert!(ErrorCode::Aborted.is_retryable());
        assert!(ErrorCode::Unavailable.is_retryable());
        assert!(!ErrorCode::NotFound.is_retryable());
        assert!(!ErrorCode::FailedPrecondition.is_retryable());
    }
}
