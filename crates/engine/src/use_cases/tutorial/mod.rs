//! Tutorial use cases.
//!
//! Tutorials are independent of each other and of progressions. Each
//! mutation loads the user's snapshot, changes one record and saves it with
//! the version it loaded.

use std::collections::BTreeMap;
use std::sync::Arc;

use milestones_domain::{Tutorial, TutorialId, TutorialSnapshot, UserId};

use crate::infrastructure::ports::{ClockPort, TutorialStateRepo, Versioned};
use crate::use_cases::context::RequestContext;
use crate::use_cases::sanitize::repo_failure;

mod error;
mod get;
mod lifecycle;
mod update;

pub use error::TutorialError;
pub use get::GetTutorials;
pub use lifecycle::{AbandonTutorial, AcceptTutorial, DeclineTutorial};
pub use update::UpdateTutorial;

/// Full per-user tutorial map.
pub type TutorialMap = BTreeMap<TutorialId, Tutorial>;

/// Container for tutorial use cases.
pub struct TutorialUseCases {
    pub get: Arc<GetTutorials>,
    pub accept: Arc<AcceptTutorial>,
    pub decline: Arc<DeclineTutorial>,
    pub abandon: Arc<AbandonTutorial>,
    pub update: Arc<UpdateTutorial>,
}

impl TutorialUseCases {
    pub fn new(
        get: Arc<GetTutorials>,
        accept: Arc<AcceptTutorial>,
        decline: Arc<DeclineTutorial>,
        abandon: Arc<AbandonTutorial>,
        update: Arc<UpdateTutorial>,
    ) -> Self {
        Self {
            get,
            accept,
            decline,
            abandon,
            update,
        }
    }
}

async fn load_snapshot(
    repo: &dyn TutorialStateRepo,
    user_id: &UserId,
) -> Result<Versioned<TutorialSnapshot>, TutorialError> {
    repo.load(user_id)
        .await
        .map_err(|e| repo_failure(e, "load_tutorials").into())
}

async fn save_snapshot(
    ctx: &RequestContext,
    repo: &dyn TutorialStateRepo,
    clock: &dyn ClockPort,
    user_id: &UserId,
    snapshot: &TutorialSnapshot,
    expected_version: u64,
) -> Result<u64, TutorialError> {
    ctx.ensure_active(clock)?;
    repo.save(user_id, snapshot, expected_version)
        .await
        .map_err(|e| repo_failure(e, "save_tutorials").into())
}
