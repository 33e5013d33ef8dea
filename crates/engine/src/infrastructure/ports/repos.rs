//! Per-user state store ports.
//!
//! Stores hand out a version with every load; a save must quote the version it
//! read. Version 0 means "never stored". Mismatches fail with
//! `RepoError::Conflict` and are never retried here.

use async_trait::async_trait;
use milestones_domain::{ProgressionSnapshot, TutorialSnapshot, UserId};

use super::error::RepoError;

/// A stored value and the version it was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }
}

// =============================================================================
// Progression Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressionStateRepo: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Versioned<ProgressionSnapshot>, RepoError>;

    /// Store `snapshot` if the current version is `expected_version`.
    /// Returns the new version.
    async fn save(
        &self,
        user_id: &UserId,
        snapshot: &ProgressionSnapshot,
        expected_version: u64,
    ) -> Result<u64, RepoError>;
}

// =============================================================================
// Tutorial Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TutorialStateRepo: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Versioned<TutorialSnapshot>, RepoError>;

    async fn save(
        &self,
        user_id: &UserId,
        snapshot: &TutorialSnapshot,
        expected_version: u64,
    ) -> Result<u64, RepoError>;
}
