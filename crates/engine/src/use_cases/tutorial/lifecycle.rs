//! Accept, decline and abandon use cases.
//!
//! All three set the tutorial's state directly; only existence is checked.

use std::sync::Arc;

use milestones_domain::{Tutorial, TutorialCatalog, UserId};
use tracing::Instrument;

use crate::infrastructure::ports::{ClockPort, TutorialStateRepo};
use crate::use_cases::context::RequestContext;

use super::{load_snapshot, save_snapshot, TutorialError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Accept,
    Decline,
    Abandon,
}

impl Transition {
    fn name(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Abandon => "abandon",
        }
    }
}

struct TransitionTutorial {
    catalog: Arc<TutorialCatalog>,
    repo: Arc<dyn TutorialStateRepo>,
    clock: Arc<dyn ClockPort>,
}

impl TransitionTutorial {
    async fn run(
        &self,
        ctx: &RequestContext,
        tutorial_id: &str,
        user_id: &UserId,
        transition: Transition,
    ) -> Result<Tutorial, TutorialError> {
        let span = tracing::info_span!(
            "tutorial.transition",
            transition = transition.name(),
            user_id = %user_id,
            tutorial_id = %tutorial_id,
            correlation_id = %ctx.correlation_id()
        );
        self.apply(ctx, tutorial_id, user_id, transition)
            .instrument(span)
            .await
    }

    async fn apply(
        &self,
        ctx: &RequestContext,
        tutorial_id: &str,
        user_id: &UserId,
        transition: Transition,
    ) -> Result<Tutorial, TutorialError> {
        ctx.ensure_active(self.clock.as_ref())?;
        let (id, definition) = self
            .catalog
            .get(tutorial_id)
            .ok_or_else(|| TutorialError::NotFound(tutorial_id.to_string()))?;

        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        let mut snapshot = loaded.value;
        let mut record = self.catalog.record_for(&snapshot, id, definition);

        let now = self.clock.now();
        match transition {
            Transition::Accept => record.accept(definition, now),
            Transition::Decline => record.decline(now),
            Transition::Abandon => record.abandon(now),
        }
        let tutorial = Tutorial::from_parts(id.clone(), definition, &record);
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

        tracing::info!(state = %tutorial.state, "Tutorial state changed");
        Ok(tutorial)
    }
}

macro_rules! transition_use_case {
    ($(#[$doc:meta])* $name:ident, $transition:expr) => {
        $(#[$doc])*
        pub struct $name {
            inner: TransitionTutorial,
        }

        impl $name {
            pub fn new(
                catalog: Arc<TutorialCatalog>,
                repo: Arc<dyn TutorialStateRepo>,
                clock: Arc<dyn ClockPort>,
            ) -> Self {
                Self {
                    inner: TransitionTutorial {
                        catalog,
                        repo,
                        clock,
                    },
                }
            }

            pub async fn execute(
                &self,
                ctx: &RequestContext,
                tutorial_id: &str,
                user_id: &UserId,
            ) -> Result<Tutorial, TutorialError> {
                self.inner.run(ctx, tutorial_id, user_id, $transition).await
            }
        }
    };
}

transition_use_case!(
    /// Accept a tutorial. A declined, abandoned or completed tutorial
    /// restarts from its first step.
    AcceptTutorial,
    Transition::Accept
);
transition_use_case!(
    /// Decline a tutorial.
    DeclineTutorial,
    Transition::Decline
);
transition_use_case!(
    /// Abandon a tutorial.
    AbandonTutorial,
    Transition::Abandon
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::InMemoryTutorialStore;
    use crate::infrastructure::ports::{MockTutorialStateRepo, RepoError, Versioned};
    use crate::test_fixtures::{tutorial_catalog, user};
    use chrono::{TimeZone, Utc};
    use milestones_domain::{TutorialId, TutorialRecord, TutorialSnapshot, TutorialState};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap()))
    }

    #[tokio::test]
    async fn accept_persists_state() {
        let store = Arc::new(InMemoryTutorialStore::new());
        let accept = AcceptTutorial::new(tutorial_catalog(), store.clone(), clock());
        let u1 = user("u1");

        let tutorial = accept
            .execute(&RequestContext::new(), "intro", &u1)
            .await
            .unwrap();
        assert_eq!(tutorial.state, TutorialState::Accepted);
        assert_eq!(tutorial.current_step, 0);

        let stored = TutorialStateRepo::load(store.as_ref(), &u1).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(
            stored.value.tutorials[&TutorialId::new("intro").unwrap()].state,
            TutorialState::Accepted
        );
    }

    #[tokio::test]
    async fn accept_restarts_completed_tutorial() {
        let mut repo = MockTutorialStateRepo::new();
        repo.expect_load().returning(|_| {
            let mut snapshot = TutorialSnapshot::default();
            snapshot.tutorials.insert(
                TutorialId::new("crafting").unwrap(),
                TutorialRecord {
                    state: TutorialState::Completed,
                    step: 4,
                    updated_at: None,
                },
            );
            Ok(Versioned::new(snapshot, 5))
        });
        repo.expect_save()
            .withf(|_, _, expected| *expected == 5)
            .returning(|_, _, _| Ok(6));

        let accept = AcceptTutorial::new(tutorial_catalog(), Arc::new(repo), clock());
        let tutorial = accept
            .execute(&RequestContext::new(), "crafting", &user("u1"))
            .await
            .unwrap();

        assert_eq!(tutorial.state, TutorialState::Accepted);
        assert_eq!(tutorial.current_step, 1);
    }

    #[tokio::test]
    async fn decline_and_abandon_set_state() {
        let store = Arc::new(InMemoryTutorialStore::new());
        let decline = DeclineTutorial::new(tutorial_catalog(), store.clone(), clock());
        let abandon = AbandonTutorial::new(tutorial_catalog(), store.clone(), clock());
        let u1 = user("u1");
        let ctx = RequestContext::new();

        let declined = decline.execute(&ctx, "intro", &u1).await.unwrap();
        assert_eq!(declined.state, TutorialState::Declined);

        let abandoned = abandon.execute(&ctx, "crafting", &u1).await.unwrap();
        assert_eq!(abandoned.state, TutorialState::Abandoned);
        assert_eq!(
            TutorialStateRepo::load(store.as_ref(), &u1).await.unwrap().version,
            2
        );
    }

    #[tokio::test]
    async fn unknown_tutorial_is_not_found() {
        let mut repo = MockTutorialStateRepo::new();
        repo.expect_load().never();

        let abandon = AbandonTutorial::new(tutorial_catalog(), Arc::new(repo), clock());
        let err = abandon
            .execute(&RequestContext::new(), "ghost", &user("u1"))
            .await
            .unwrap_err();
        assert_eq!(err, TutorialError::NotFound("ghost".into()));
    }

    #[tokio::test]
    async fn conflict_is_store_conflict() {
        let mut repo = MockTutorialStateRepo::new();
        repo.expect_load()
            .returning(|_| Ok(Versioned::new(TutorialSnapshot::default(), 1)));
        repo.expect_save()
            .returning(|user_id, _, expected| Err(RepoError::conflict(user_id, expected, 2)));

        let decline = DeclineTutorial::new(tutorial_catalog(), Arc::new(repo), clock());
        let err = decline
            .execute(&RequestContext::new(), "intro", &user("u1"))
            .await
            .unwrap_err();
        assert_eq!(err, TutorialError::StoreConflict);
    }
}
