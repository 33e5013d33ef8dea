//! External service ports.

use async_trait::async_trait;
use milestones_domain::{ProgressionCost, UserId};

use super::error::WalletError;

/// Economy capability used by purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletPort: Send + Sync {
    /// Deduct every amount in `cost`, or nothing at all.
    async fn charge(&self, user_id: &UserId, cost: &ProgressionCost) -> Result<(), WalletError>;

    /// Give back a previous charge when the purchase could not be saved.
    async fn refund(&self, user_id: &UserId, cost: &ProgressionCost) -> Result<(), WalletError>;
}
