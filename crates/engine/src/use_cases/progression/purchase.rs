//! Purchase progression use case.
//!
//! Charges the progression's cost through the wallet and unlocks it.
//! Dependent progressions unlock in the same call.

use std::sync::Arc;

use milestones_domain::{ProgressionCatalog, ProgressionCost, ProgressionId, ProgressionLedger, UserId};
use tracing::instrument;

use crate::infrastructure::ports::{ClockPort, ProgressionStateRepo, WalletPort};
use crate::use_cases::context::RequestContext;
use crate::use_cases::sanitize::wallet_failure;

use super::{load_snapshot, log_unlocked, save_snapshot, ProgressionError, ProgressionMap};

pub struct PurchaseProgression {
    catalog: Arc<ProgressionCatalog>,
    repo: Arc<dyn ProgressionStateRepo>,
    wallet: Arc<dyn WalletPort>,
    clock: Arc<dyn ClockPort>,
}

impl PurchaseProgression {
    pub fn new(
        catalog: Arc<ProgressionCatalog>,
        repo: Arc<dyn ProgressionStateRepo>,
        wallet: Arc<dyn WalletPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            catalog,
            repo,
            wallet,
            clock,
        }
    }

    /// Execute the purchase progression use case.
    ///
    /// Validation runs before the wallet is touched. Once charged, any failure
    /// to persist the unlock refunds the charge before the error is returned.
    ///
    /// # Returns
    /// * `Ok(ProgressionMap)` - Every progression after the purchase
    /// * `Err(ProgressionError)` - Nothing was charged, or the charge was refunded
    #[instrument(
        name = "progression.purchase",
        skip_all,
        fields(
            user_id = %user_id,
            progression_id = %progression_id,
            correlation_id = %ctx.correlation_id()
        )
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        progression_id: &str,
    ) -> Result<ProgressionMap, ProgressionError> {
        ctx.ensure_active(self.clock.as_ref())?;

        let idx = self
            .catalog
            .index_of(progression_id)
            .ok_or_else(|| ProgressionError::NotFound(progression_id.to_string()))?;
        let entry = self.catalog.entry(idx);
        let id = entry.id().clone();
        let cost = entry
            .cost()
            .ok_or_else(|| ProgressionError::NotAvailableForPurchase(id.clone()))?;
        if cost.is_free() {
            return Err(ProgressionError::NoCostAssociated(id));
        }

        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        let mut ledger = ProgressionLedger::new(&self.catalog, loaded.value);
        ledger.reconcile(self.clock.now());

        if ledger.is_unlocked(idx) {
            return Err(ProgressionError::AlreadyUnlocked(id));
        }
        if !ledger.purchase_ready(idx) {
            return Err(ProgressionError::PreconditionNotMet(id));
        }

        ctx.ensure_active(self.clock.as_ref())?;
        self.wallet
            .charge(user_id, cost)
            .await
            .map_err(|e| ProgressionError::from(wallet_failure(e)))?;

        let now = self.clock.now();
        ledger.unlock(idx, now);
        let mut unlocked = vec![id.clone()];
        unlocked.extend(ledger.reconcile(now));
        let progressions = ledger.views();

        let saved = save_snapshot(
            ctx,
            self.repo.as_ref(),
            self.clock.as_ref(),
            user_id,
            &ledger.into_snapshot(),
            loaded.version,
        )
        .await;
        if let Err(err) = saved {
            self.refund(user_id, &id, cost).await;
            return Err(err);
        }

        log_unlocked(&unlocked);
        Ok(progressions)
    }

    async fn refund(&self, user_id: &UserId, progression_id: &ProgressionId, cost: &ProgressionCost) {
        match self.wallet.refund(user_id, cost).await {
            Ok(()) => tracing::info!(progression_id = %progression_id, "Purchase refunded"),
            Err(e) => tracing::error!(
                error = %e,
                progression_id = %progression_id,
                "Failed to refund purchase; wallet needs manual reconciliation"
            ),
        }
    }
}
