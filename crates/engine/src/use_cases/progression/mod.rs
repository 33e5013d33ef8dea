//! Progression use cases.
//!
//! Every operation loads the caller's snapshot, lines it up with the catalog
//! in a `ProgressionLedger`, reconciles unlocks in evaluation order and saves
//! with the version it loaded. Nothing is cached between calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use milestones_domain::{Progression, ProgressionId, ProgressionSnapshot, UserId};

use crate::infrastructure::ports::{ClockPort, ProgressionStateRepo, Versioned};
use crate::use_cases::context::RequestContext;
use crate::use_cases::sanitize::repo_failure;

mod error;
mod get;
mod purchase;
mod update;

pub use error::ProgressionError;
pub use get::{GetProgressions, ProgressionsResult};
pub use purchase::PurchaseProgression;
pub use update::UpdateProgression;

/// Full per-user progression map returned by every operation.
pub type ProgressionMap = BTreeMap<ProgressionId, Progression>;

/// Container for progression use cases.
pub struct ProgressionUseCases {
    pub get: Arc<GetProgressions>,
    pub purchase: Arc<PurchaseProgression>,
    pub update: Arc<UpdateProgression>,
}

impl ProgressionUseCases {
    pub fn new(
        get: Arc<GetProgressions>,
        purchase: Arc<PurchaseProgression>,
        update: Arc<UpdateProgression>,
    ) -> Self {
        Self {
            get,
            purchase,
            update,
        }
    }
}

async fn load_snapshot(
    repo: &dyn ProgressionStateRepo,
    user_id: &UserId,
) -> Result<Versioned<ProgressionSnapshot>, ProgressionError> {
    repo.load(user_id)
        .await
        .map_err(|e| repo_failure(e, "load_progressions").into())
}

/// Check the context one last time, then save against `expected_version`.
async fn save_snapshot(
    ctx: &RequestContext,
    repo: &dyn ProgressionStateRepo,
    clock: &dyn ClockPort,
    user_id: &UserId,
    snapshot: &ProgressionSnapshot,
    expected_version: u64,
) -> Result<u64, ProgressionError> {
    ctx.ensure_active(clock)?;
    repo.save(user_id, snapshot, expected_version)
        .await
        .map_err(|e| repo_failure(e, "save_progressions").into())
}

fn log_unlocked(unlocked: &[ProgressionId]) {
    for progression_id in unlocked {
        tracing::info!(progression_id = %progression_id, "Progression unlocked");
    }
}
