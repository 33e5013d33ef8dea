//! Get progressions use case.
//!
//! Returns every progression for a user, with deltas against whatever the
//! caller last saw.

use std::collections::BTreeMap;
use std::sync::Arc;

use milestones_domain::{ProgressionCatalog, ProgressionDelta, ProgressionId, ProgressionLedger, UserId};
use serde::Serialize;
use tracing::instrument;

use crate::infrastructure::ports::{ClockPort, ProgressionStateRepo};
use crate::use_cases::context::RequestContext;

use super::{load_snapshot, log_unlocked, save_snapshot, ProgressionError, ProgressionMap};

/// Result of a Get: the full map plus what changed since `last_known`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressionsResult {
    pub progressions: ProgressionMap,
    pub deltas: BTreeMap<ProgressionId, ProgressionDelta>,
}

pub struct GetProgressions {
    catalog: Arc<ProgressionCatalog>,
    repo: Arc<dyn ProgressionStateRepo>,
    clock: Arc<dyn ClockPort>,
}

impl GetProgressions {
    pub fn new(
        catalog: Arc<ProgressionCatalog>,
        repo: Arc<dyn ProgressionStateRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            catalog,
            repo,
            clock,
        }
    }

    /// Execute the get progressions use case.
    ///
    /// Records never seen before are defaulted and every satisfied locked
    /// progression is unlocked. The snapshot is saved only when one of those
    /// two things happened.
    ///
    /// # Arguments
    /// * `last_known` - The map the caller received last time; `None` reports
    ///   every progression as added
    #[instrument(
        name = "progression.get",
        skip_all,
        fields(user_id = %user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        last_known: Option<&ProgressionMap>,
    ) -> Result<ProgressionsResult, ProgressionError> {
        ctx.ensure_active(self.clock.as_ref())?;

        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        let mut ledger = ProgressionLedger::new(&self.catalog, loaded.value);
        let unlocked = ledger.reconcile(self.clock.now());

        let progressions = ledger.views();
        let deltas = progressions
            .iter()
            .filter_map(|(id, view)| {
                let before = last_known.and_then(|known| known.get(id));
                view.delta_from(before).map(|delta| (id.clone(), delta))
            })
            .collect();

        if ledger.is_dirty() {
            save_snapshot(
                ctx,
                self.repo.as_ref(),
                self.clock.as_ref(),
                user_id,
                &ledger.into_snapshot(),
                loaded.version,
            )
            .await?;
            log_unlocked(&unlocked);
        }

        Ok(ProgressionsResult {
            progressions,
            deltas,
        })
    }
}
