//! Progression ledger - one user's records lined up with the catalog arena
//!
//! A ledger is the working copy for a single call. It is built from the stored
//! snapshot, mutated (unlock, counter updates), reconciled in evaluation order
//! and turned back into a snapshot for the store. Records for progressions the
//! catalog no longer defines are carried through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::progression_catalog::{Evaluation, ProgressionCatalog};
use crate::entities::{Progression, ProgressionRecord, ProgressionSnapshot};
use crate::error::DomainError;
use crate::ids::ProgressionId;

pub struct ProgressionLedger<'a> {
    catalog: &'a ProgressionCatalog,
    records: Vec<ProgressionRecord>,
    retired: BTreeMap<ProgressionId, ProgressionRecord>,
    dirty: bool,
}

impl<'a> ProgressionLedger<'a> {
    /// Align a stored snapshot with the catalog, defaulting missing records.
    pub fn new(catalog: &'a ProgressionCatalog, snapshot: ProgressionSnapshot) -> Self {
        let mut stored = snapshot.progressions;
        let mut dirty = false;
        let records = catalog
            .entries()
            .iter()
            .map(|entry| {
                stored.remove(entry.id()).unwrap_or_else(|| {
                    dirty = true;
                    ProgressionRecord::default()
                })
            })
            .collect();

        Self {
            catalog,
            records,
            retired: stored,
            dirty,
        }
    }

    /// True when the ledger differs from the snapshot it was built from.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn record(&self, idx: usize) -> &ProgressionRecord {
        &self.records[idx]
    }

    pub fn is_unlocked(&self, idx: usize) -> bool {
        self.records[idx].unlocked
    }

    /// Whether every condition on other progressions currently holds.
    pub fn gates_satisfied(&self, idx: usize) -> bool {
        self.catalog.evaluate(idx, &self.records, Evaluation::Gates)
    }

    /// Whether the preconditions hold with the cost paid: gates plus the
    /// progression's own counter thresholds.
    pub fn purchase_ready(&self, idx: usize) -> bool {
        self.catalog.evaluate(idx, &self.records, Evaluation::Purchase)
    }

    /// Gates hold, and a purchasable progression is not bought yet.
    pub fn is_available(&self, idx: usize) -> bool {
        let purchased = self.catalog.entry(idx).is_purchasable() && self.records[idx].unlocked;
        !purchased && self.gates_satisfied(idx)
    }

    /// Unlock every progression whose preconditions now hold.
    ///
    /// One pass in evaluation order is enough: each progression is visited
    /// after everything it references, and unlocks never revert.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Vec<ProgressionId> {
        let mut unlocked = Vec::new();
        for &idx in self.catalog.order() {
            if self.records[idx].unlocked {
                continue;
            }
            if self.catalog.evaluate(idx, &self.records, Evaluation::Unlock) {
                self.records[idx].unlock(now);
                self.dirty = true;
                unlocked.push(self.catalog.entry(idx).id().clone());
            }
        }
        unlocked
    }

    /// Unlock a progression directly (purchase). Returns false if it already was.
    pub fn unlock(&mut self, idx: usize, now: DateTime<Utc>) -> bool {
        let changed = self.records[idx].unlock(now);
        self.dirty |= changed;
        changed
    }

    /// Add counter deltas, clamped to each counter's maximum.
    ///
    /// All counters are checked before any is applied. Negative deltas are
    /// ignored; counters never decrease.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` naming the first counter the
    /// progression does not track.
    pub fn apply_counts(&mut self, idx: usize, deltas: &BTreeMap<String, i64>) -> Result<(), DomainError> {
        let catalog = self.catalog;
        let counters = catalog.entry(idx).counters();
        if let Some(unknown) = deltas.keys().find(|counter| !counters.contains_key(*counter)) {
            return Err(DomainError::not_found("Counter", unknown.clone()));
        }

        let record = &mut self.records[idx];
        for (counter, delta) in deltas {
            let max = counters[counter];
            let current = record.count(counter);
            let next = current.saturating_add((*delta).max(0)).min(max).max(current);
            if next != current || !record.counts.contains_key(counter) {
                record.counts.insert(counter.clone(), next);
                self.dirty = true;
            }
        }
        Ok(())
    }

    /// Caller-facing view of one progression.
    pub fn view(&self, idx: usize) -> Progression {
        let entry = self.catalog.entry(idx);
        let definition = entry.definition();
        let record = &self.records[idx];
        Progression {
            id: entry.id().clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            category: definition.category.clone(),
            additional_properties: definition.additional_properties.clone(),
            unlocked: record.unlocked,
            available: self.is_available(idx),
            counts: entry
                .counters()
                .keys()
                .map(|counter| (counter.clone(), record.count(counter)))
                .collect(),
            max_counts: entry.counters().clone(),
            cost: entry.cost().cloned(),
            preconditions: definition.preconditions.clone(),
        }
    }

    /// Views of every defined progression, keyed by id.
    pub fn views(&self) -> BTreeMap<ProgressionId, Progression> {
        (0..self.records.len())
            .map(|idx| (self.catalog.entry(idx).id().clone(), self.view(idx)))
            .collect()
    }

    /// Snapshot to hand back to the store.
    pub fn into_snapshot(self) -> ProgressionSnapshot {
        let mut progressions = self.retired;
        for (entry, record) in self.catalog.entries().iter().zip(self.records) {
            progressions.insert(entry.id().clone(), record);
        }
        ProgressionSnapshot { progressions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::ProgressionConfig;
    use crate::entities::ProgressionDefinition;
    use crate::value_objects::{
        CountRequirement, PreconditionOperator, Preconditions, PreconditionsBlock, ProgressionCost,
    };

    fn pid(id: &str) -> ProgressionId {
        ProgressionId::new(id).unwrap()
    }

    fn requires(ids: &[&str]) -> Preconditions {
        Preconditions {
            progressions: ids.iter().map(|id| pid(id)).collect(),
            ..Default::default()
        }
    }

    fn priced(gold: i64) -> Preconditions {
        Preconditions {
            cost: Some(ProgressionCost {
                currencies: BTreeMap::from([("gold".to_string(), gold)]),
                items: BTreeMap::new(),
            }),
            ..Default::default()
        }
    }

    fn kills(threshold: i64) -> Preconditions {
        Preconditions {
            counts: BTreeMap::from([("kills".to_string(), threshold)]),
            ..Default::default()
        }
    }

    fn catalog(defs: Vec<(&str, ProgressionDefinition)>) -> ProgressionCatalog {
        ProgressionCatalog::from_config(ProgressionConfig {
            progressions: defs.into_iter().map(|(id, def)| (pid(id), def)).collect(),
        })
        .unwrap()
    }

    fn idx(catalog: &ProgressionCatalog, id: &str) -> usize {
        catalog.index_of(id).unwrap()
    }

    #[test]
    fn progression_without_preconditions_is_available_and_unlocked() {
        let catalog = catalog(vec![("welcome", ProgressionDefinition::new("Welcome"))]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());

        assert!(ledger.is_dirty(), "defaulted records must be persisted");
        let unlocked = ledger.reconcile(Utc::now());

        assert_eq!(unlocked, vec![pid("welcome")]);
        let view = ledger.view(0);
        assert!(view.available);
        assert!(view.unlocked);
    }

    #[test]
    fn purchasable_progression_is_available_until_bought() {
        let catalog = catalog(vec![(
            "shop",
            ProgressionDefinition::new("Shop").with_preconditions(PreconditionsBlock::direct(priced(100))),
        )]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());

        assert!(!ledger.is_unlocked(0), "cost never unlocks on its own");
        assert!(ledger.is_available(0));

        assert!(ledger.unlock(0, Utc::now()));
        assert!(!ledger.is_available(0));
    }

    #[test]
    fn purchase_waits_for_own_thresholds_anded_with_cost() {
        let elite = PreconditionsBlock::direct(Preconditions {
            counts: BTreeMap::from([("kills".to_string(), 10)]),
            ..priced(100)
        });
        let catalog = catalog(vec![("elite", ProgressionDefinition::new("Elite").with_preconditions(elite))]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());

        assert!(ledger.is_available(0), "counting towards it is allowed");
        assert!(!ledger.purchase_ready(0));

        ledger
            .apply_counts(0, &BTreeMap::from([("kills".to_string(), 10)]))
            .unwrap();
        ledger.reconcile(Utc::now());
        assert!(!ledger.is_unlocked(0), "still needs to be bought");
        assert!(ledger.purchase_ready(0));
    }

    #[test]
    fn count_or_cost_can_be_bought_without_counting() {
        let block = PreconditionsBlock::direct(kills(10))
            .with_nested(PreconditionOperator::Or, PreconditionsBlock::direct(priced(100)));
        let catalog = catalog(vec![("either", ProgressionDefinition::new("Either").with_preconditions(block))]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());

        assert!(ledger.purchase_ready(0));
    }

    #[test]
    fn view_carries_definition_metadata() {
        let catalog = catalog(vec![(
            "welcome",
            ProgressionDefinition::new("Welcome")
                .with_category("onboarding")
                .with_property("icon", "wave"),
        )]);
        let ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());

        let view = ledger.view(0);
        assert_eq!(view.category, "onboarding");
        assert_eq!(view.additional_properties.get("icon").map(String::as_str), Some("wave"));
    }

    #[test]
    fn unlock_cascades_in_a_single_reconcile() {
        let catalog = catalog(vec![
            (
                "p1",
                ProgressionDefinition::new("P1").with_preconditions(PreconditionsBlock::direct(priced(5))),
            ),
            (
                "p2",
                ProgressionDefinition::new("P2").with_preconditions(PreconditionsBlock::direct(requires(&["p1"]))),
            ),
            (
                "p3",
                ProgressionDefinition::new("P3").with_preconditions(PreconditionsBlock::direct(requires(&["p2"]))),
            ),
        ]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());
        assert!(!ledger.is_available(idx(&catalog, "p2")));

        ledger.unlock(idx(&catalog, "p1"), Utc::now());
        let unlocked = ledger.reconcile(Utc::now());

        assert_eq!(unlocked, vec![pid("p2"), pid("p3")]);
        assert!(ledger.view(idx(&catalog, "p2")).available);
    }

    #[test]
    fn unlock_is_monotonic_even_when_gates_stop_holding() {
        // "rookie" holds only while "veteran" is locked.
        let block = PreconditionsBlock::default()
            .with_nested(PreconditionOperator::Not, PreconditionsBlock::direct(requires(&["veteran"])));
        let catalog = catalog(vec![
            ("rookie", ProgressionDefinition::new("Rookie").with_preconditions(block)),
            (
                "veteran",
                ProgressionDefinition::new("Veteran").with_preconditions(PreconditionsBlock::direct(priced(1))),
            ),
        ]);

        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());
        let rookie = idx(&catalog, "rookie");
        assert!(ledger.is_unlocked(rookie));

        ledger.unlock(idx(&catalog, "veteran"), Utc::now());
        ledger.reconcile(Utc::now());
        assert!(ledger.is_unlocked(rookie));
        assert!(!ledger.is_available(rookie));
    }

    #[test]
    fn counts_clamp_at_maximum_and_unlock() {
        let catalog = catalog(vec![(
            "slayer",
            ProgressionDefinition::new("Slayer").with_preconditions(PreconditionsBlock::direct(kills(10))),
        )]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());
        assert!(!ledger.is_unlocked(0));
        assert!(ledger.is_available(0));

        ledger
            .apply_counts(0, &BTreeMap::from([("kills".to_string(), 15)]))
            .unwrap();
        ledger.reconcile(Utc::now());

        assert_eq!(ledger.record(0).count("kills"), 10);
        assert!(ledger.is_unlocked(0));
    }

    #[test]
    fn negative_deltas_never_decrease_counts() {
        let catalog = catalog(vec![(
            "slayer",
            ProgressionDefinition::new("Slayer").with_preconditions(PreconditionsBlock::direct(kills(10))),
        )]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger
            .apply_counts(0, &BTreeMap::from([("kills".to_string(), 4)]))
            .unwrap();
        ledger
            .apply_counts(0, &BTreeMap::from([("kills".to_string(), -3)]))
            .unwrap();
        assert_eq!(ledger.record(0).count("kills"), 4);
    }

    #[test]
    fn unknown_counter_rejects_whole_update() {
        let catalog = catalog(vec![(
            "slayer",
            ProgressionDefinition::new("Slayer").with_preconditions(PreconditionsBlock::direct(kills(10))),
        )]);
        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        let err = ledger
            .apply_counts(
                0,
                &BTreeMap::from([("kills".to_string(), 3), ("assists".to_string(), 1)]),
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(ledger.record(0).count("kills"), 0);
    }

    #[test]
    fn count_requirement_on_other_progression_gates_availability() {
        let gate = PreconditionsBlock::direct(Preconditions {
            progression_counts: vec![CountRequirement {
                progression: pid("arena"),
                counter: "wins".to_string(),
                min: 3,
            }],
            ..priced(50)
        });
        let catalog = catalog(vec![
            ("arena", ProgressionDefinition::new("Arena").with_max_count("wins", 100)),
            ("champion", ProgressionDefinition::new("Champion").with_preconditions(gate)),
        ]);
        let arena = idx(&catalog, "arena");
        let champion = idx(&catalog, "champion");

        let mut ledger = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        ledger.reconcile(Utc::now());
        assert!(!ledger.is_available(champion));

        ledger
            .apply_counts(arena, &BTreeMap::from([("wins".to_string(), 3)]))
            .unwrap();
        ledger.reconcile(Utc::now());
        assert!(ledger.is_available(champion));
        assert!(!ledger.is_unlocked(champion));
    }

    #[test]
    fn retired_records_survive_round_trip() {
        let catalog = catalog(vec![("current", ProgressionDefinition::new("Current"))]);
        let mut snapshot = ProgressionSnapshot::default();
        snapshot.progressions.insert(
            pid("removed"),
            ProgressionRecord {
                unlocked: true,
                ..Default::default()
            },
        );

        let mut ledger = ProgressionLedger::new(&catalog, snapshot);
        ledger.reconcile(Utc::now());
        let snapshot = ledger.into_snapshot();

        assert!(snapshot.progressions[&pid("removed")].unlocked);
        assert!(snapshot.progressions[&pid("current")].unlocked);
    }

    #[test]
    fn clean_snapshot_is_not_dirty() {
        let catalog = catalog(vec![("welcome", ProgressionDefinition::new("Welcome"))]);
        let mut first = ProgressionLedger::new(&catalog, ProgressionSnapshot::default());
        first.reconcile(Utc::now());
        let stored = first.into_snapshot();

        let mut second = ProgressionLedger::new(&catalog, stored);
        assert!(second.reconcile(Utc::now()).is_empty());
        assert!(!second.is_dirty());
    }
}
