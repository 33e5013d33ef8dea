//! Update tutorial use case.
//!
//! Moves a tutorial forward to a step. Steps are clamped to the definition's
//! range and never move backward; reaching the last step completes it.

use std::sync::Arc;

use milestones_domain::{TutorialCatalog, UserId};
use tracing::instrument;

use crate::infrastructure::ports::{ClockPort, TutorialStateRepo};
use crate::use_cases::context::RequestContext;

use super::{load_snapshot, save_snapshot, TutorialError, TutorialMap};

pub struct UpdateTutorial {
    catalog: Arc<TutorialCatalog>,
    repo: Arc<dyn TutorialStateRepo>,
    clock: Arc<dyn ClockPort>,
}

impl UpdateTutorial {
    pub fn new(
        catalog: Arc<TutorialCatalog>,
        repo: Arc<dyn TutorialStateRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            catalog,
            repo,
            clock,
        }
    }

    /// Execute the update tutorial use case.
    ///
    /// # Returns
    /// * `Ok(TutorialMap)` - Every tutorial after the update
    /// * `Err(TutorialError::NotAvailableForUpdate)` - The tutorial was
    ///   declined, abandoned or already completed
    #[instrument(
        name = "tutorial.update",
        skip_all,
        fields(
            user_id = %user_id,
            tutorial_id = %tutorial_id,
            step = step,
            correlation_id = %ctx.correlation_id()
        )
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        tutorial_id: &str,
        step: u32,
    ) -> Result<TutorialMap, TutorialError> {
        ctx.ensure_active(self.clock.as_ref())?;
        let (id, definition) = self
            .catalog
            .get(tutorial_id)
            .ok_or_else(|| TutorialError::NotFound(tutorial_id.to_string()))?;

        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        let mut snapshot = loaded.value;
        let mut record = self.catalog.record_for(&snapshot, id, definition);

        record
            .advance(definition, step, self.clock.now())
            .map_err(|e| {
                tracing::debug!(error = %e, "Tutorial update rejected");
                TutorialError::NotAvailableForUpdate(id.clone())
            })?;
        let state = record.state;
        snapshot.tutorials.insert(id.clone(), record);

        save_snapshot(
            ctx,
            self.repo.as_ref(),
            self.clock.as_ref(),
            user_id,
            &snapshot,
            loaded.version,
        )
        .await?;

        tracing::info!(state = %state, "Tutorial advanced");
        Ok(self.catalog.views(&snapshot))
    }
}
