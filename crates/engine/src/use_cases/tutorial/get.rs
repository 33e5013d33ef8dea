//! Get tutorials use case.

use std::sync::Arc;

use milestones_domain::{TutorialCatalog, UserId};
use tracing::instrument;

use crate::infrastructure::ports::{ClockPort, TutorialStateRepo};
use crate::use_cases::context::RequestContext;

use super::{load_snapshot, TutorialError, TutorialMap};

/// Read-only: tutorials the user never touched are reported as
/// `NotStarted` at their first step without being stored.
pub struct GetTutorials {
    catalog: Arc<TutorialCatalog>,
    repo: Arc<dyn TutorialStateRepo>,
    clock: Arc<dyn ClockPort>,
}

impl GetTutorials {
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

    #[instrument(
        name = "tutorial.get",
        skip_all,
        fields(user_id = %user_id, correlation_id = %ctx.correlation_id())
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
    ) -> Result<TutorialMap, TutorialError> {
        ctx.ensure_active(self.clock.as_ref())?;
        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        Ok(self.catalog.views(&loaded.value))
    }
}
