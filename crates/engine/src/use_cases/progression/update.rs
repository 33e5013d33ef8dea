//! Update progression use case.
//!
//! Adds to a progression's counters. Counters never decrease and never pass
//! their maximum; reaching a threshold unlocks the progression and anything
//! depending on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use milestones_domain::{DomainError, ProgressionCatalog, ProgressionLedger, UserId};
use tracing::instrument;

use crate::infrastructure::ports::{ClockPort, ProgressionStateRepo};
use crate::use_cases::context::RequestContext;

use super::{load_snapshot, log_unlocked, save_snapshot, ProgressionError, ProgressionMap};

pub struct UpdateProgression {
    catalog: Arc<ProgressionCatalog>,
    repo: Arc<dyn ProgressionStateRepo>,
    clock: Arc<dyn ClockPort>,
}

impl UpdateProgression {
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

    /// Execute the update progression use case.
    ///
    /// # Arguments
    /// * `counts` - Amount to add per counter. Negative amounts are ignored.
    ///
    /// # Returns
    /// * `Ok(ProgressionMap)` - Every progression after the update
    /// * `Err(ProgressionError)` - Nothing was changed
    #[instrument(
        name = "progression.update",
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
        counts: &BTreeMap<String, i64>,
    ) -> Result<ProgressionMap, ProgressionError> {
        ctx.ensure_active(self.clock.as_ref())?;

        let idx = self
            .catalog
            .index_of(progression_id)
            .ok_or_else(|| ProgressionError::NotFound(progression_id.to_string()))?;
        let entry = self.catalog.entry(idx);
        let id = entry.id().clone();
        if !entry.has_counters() {
            return Err(ProgressionError::NotAvailableForUpdate(id));
        }
        if let Some(counter) = counts.keys().find(|c| !entry.counters().contains_key(*c)) {
            return Err(ProgressionError::NoCountAssociated {
                progression_id: id,
                counter: counter.clone(),
            });
        }

        let loaded = load_snapshot(self.repo.as_ref(), user_id).await?;
        let mut ledger = ProgressionLedger::new(&self.catalog, loaded.value);
        let now = self.clock.now();
        let mut unlocked = ledger.reconcile(now);

        if !ledger.gates_satisfied(idx) {
            return Err(ProgressionError::PreconditionNotMet(id));
        }

        ledger.apply_counts(idx, counts).map_err(|e| match e {
            DomainError::NotFound { id: counter, .. } => ProgressionError::NoCountAssociated {
                progression_id: id.clone(),
                counter,
            },
            other => {
                tracing::error!(error = %other, "Counter update rejected");
                ProgressionError::NotAvailableForUpdate(id.clone())
            }
        })?;
        unlocked.extend(ledger.reconcile(now));
        let progressions = ledger.views();

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

        Ok(progressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::InMemoryProgressionStore;
    use crate::infrastructure::ports::{MockProgressionStateRepo, RepoError, Versioned};
    use crate::test_fixtures::{progression_catalog, user};
    use chrono::{TimeZone, Utc};
    use milestones_domain::{ProgressionId, ProgressionSnapshot};

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap()))
    }

    fn pid(id: &str) -> ProgressionId {
        ProgressionId::new(id).unwrap()
    }

    fn counts(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn in_memory() -> (UpdateProgression, Arc<InMemoryProgressionStore>) {
        let store = Arc::new(InMemoryProgressionStore::new());
        (
            UpdateProgression::new(progression_catalog(), store.clone(), clock()),
            store,
        )
    }

    #[tokio::test]
    async fn unknown_progression_is_not_found() {
        let (use_case, _) = in_memory();
        let err = use_case
            .execute(&RequestContext::new(), &user("u1"), "ghost", &counts(&[("kills", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, ProgressionError::NotFound("ghost".into()));
    }

    #[tokio::test]
    async fn progression_without_counters_is_not_updatable() {
        let (use_case, _) = in_memory();
        let err = use_case
            .execute(&RequestContext::new(), &user("u1"), "p2", &counts(&[("kills", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, ProgressionError::NotAvailableForUpdate(pid("p2")));
    }

    #[tokio::test]
    async fn unknown_counter_rejects_whole_update() {
        let mut repo = MockProgressionStateRepo::new();
        repo.expect_load().never();
        repo.expect_save().never();
        let use_case = UpdateProgression::new(progression_catalog(), Arc::new(repo), clock());

        let err = use_case
            .execute(
                &RequestContext::new(),
                &user("u1"),
                "slayer",
                &counts(&[("kills", 3), ("deaths", 1)]),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProgressionError::NoCountAssociated {
                progression_id: pid("slayer"),
                counter: "deaths".into()
            }
        );
    }

    #[tokio::test]
    async fn counts_clamp_at_maximum_and_unlock() {
        let (use_case, _) = in_memory();
        let progressions = use_case
            .execute(&RequestContext::new(), &user("u1"), "slayer", &counts(&[("kills", 15)]))
            .await
            .unwrap();

        let slayer = &progressions[&pid("slayer")];
        assert_eq!(slayer.counts["kills"], 10);
        assert_eq!(slayer.max_counts["kills"], 10);
        assert!(slayer.unlocked);
    }

    #[tokio::test]
    async fn counts_accumulate_and_ignore_negative_deltas() {
        let (use_case, _) = in_memory();
        let ctx = RequestContext::new();
        let u1 = user("u1");

        use_case.execute(&ctx, &u1, "slayer", &counts(&[("kills", 4)])).await.unwrap();
        let progressions = use_case
            .execute(&ctx, &u1, "slayer", &counts(&[("kills", -3)]))
            .await
            .unwrap();
        assert_eq!(progressions[&pid("slayer")].counts["kills"], 4);

        let progressions = use_case
            .execute(&ctx, &u1, "slayer", &counts(&[("kills", 2)]))
            .await
            .unwrap();
        assert_eq!(progressions[&pid("slayer")].counts["kills"], 6);
        assert!(!progressions[&pid("slayer")].unlocked);
    }

    #[tokio::test]
    async fn gated_counters_require_other_progressions() {
        let (use_case, _) = in_memory();
        let ctx = RequestContext::new();
        let u1 = user("u1");

        let err = use_case
            .execute(&ctx, &u1, "veteran", &counts(&[("quests", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, ProgressionError::PreconditionNotMet(pid("veteran")));

        use_case.execute(&ctx, &u1, "slayer", &counts(&[("kills", 5)])).await.unwrap();
        let progressions = use_case
            .execute(&ctx, &u1, "veteran", &counts(&[("quests", 4)]))
            .await
            .unwrap();

        let veteran = &progressions[&pid("veteran")];
        assert_eq!(veteran.counts["quests"], 4, "explicit maximum is 5");
        assert!(veteran.unlocked);
    }

    #[tokio::test]
    async fn unlock_survives_when_not_condition_flips() {
        let (use_case, _) = in_memory();
        let ctx = RequestContext::new();
        let u1 = user("u1");

        let progressions = use_case
            .execute(&ctx, &u1, "slayer", &counts(&[("kills", 1)]))
            .await
            .unwrap();

        assert!(
            progressions[&pid("pacifist")].unlocked,
            "unlocked on the first reconcile, before the kill counted"
        );
    }

    #[tokio::test]
    async fn conflict_is_store_conflict() {
        let mut repo = MockProgressionStateRepo::new();
        repo.expect_load()
            .returning(|_| Ok(Versioned::new(ProgressionSnapshot::default(), 2)));
        repo.expect_save()
            .returning(|user_id, _, expected| Err(RepoError::conflict(user_id, expected, 3)));
        let use_case = UpdateProgression::new(progression_catalog(), Arc::new(repo), clock());

        let err = use_case
            .execute(&RequestContext::new(), &user("u1"), "slayer", &counts(&[("kills", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err, ProgressionError::StoreConflict);
    }
}
