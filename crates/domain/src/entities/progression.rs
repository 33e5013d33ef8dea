//! Progression entity - per-user unlockable milestones
//!
//! Three shapes of the same concept live here:
//! - `ProgressionDefinition` - immutable configuration, shared by every user
//! - `ProgressionRecord` - what the store keeps per user (unlock flag, counters)
//! - `Progression` - the merged view handed back to callers and used as the
//!   client's "last known" snapshot when computing deltas

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ProgressionId;
use crate::value_objects::{PreconditionsBlock, ProgressionCost};

/// Configuration for a single progression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<PreconditionsBlock>,
    /// Upper bound per counter. Counters without an entry are bounded by
    /// their highest threshold in `preconditions`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub max_counts: BTreeMap<String, i64>,
}

impl ProgressionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_preconditions(mut self, preconditions: PreconditionsBlock) -> Self {
        self.preconditions = Some(preconditions);
        self
    }

    pub fn with_max_count(mut self, counter: impl Into<String>, max: i64) -> Self {
        self.max_counts.insert(counter.into(), max);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }
}

/// Stored per-user state for one progression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl ProgressionRecord {
    pub fn count(&self, counter: &str) -> i64 {
        self.counts.get(counter).copied().unwrap_or(0)
    }

    /// Mark unlocked. Returns false when it already was.
    pub fn unlock(&mut self, now: DateTime<Utc>) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(now);
        true
    }
}

/// Everything the store keeps for one user's progressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    #[serde(default)]
    pub progressions: BTreeMap<ProgressionId, ProgressionRecord>,
}

/// Caller-facing view of a progression for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub id: ProgressionId,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub additional_properties: BTreeMap<String, String>,
    pub unlocked: bool,
    pub available: bool,
    #[serde(default)]
    pub counts: BTreeMap<String, i64>,
    #[serde(default)]
    pub max_counts: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<ProgressionCost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<PreconditionsBlock>,
}

impl Progression {
    fn metadata_differs(&self, other: &Progression) -> bool {
        self.name != other.name
            || self.description != other.description
            || self.category != other.category
            || self.additional_properties != other.additional_properties
            || self.max_counts != other.max_counts
            || self.cost != other.cost
            || self.preconditions != other.preconditions
    }

    /// Compare against what the caller last saw.
    ///
    /// Returns `None` when nothing the client could display has changed.
    pub fn delta_from(&self, last_known: Option<&Progression>) -> Option<ProgressionDelta> {
        let Some(before) = last_known else {
            return Some(ProgressionDelta {
                id: self.id.clone(),
                state: ProgressionDeltaState::Added,
                unlocked: ValueChange::added(self.unlocked),
                available: ValueChange::added(self.available),
                counts: self
                    .counts
                    .iter()
                    .map(|(counter, after)| (counter.clone(), ValueChange::added(*after)))
                    .collect(),
                metadata_changed: false,
            });
        };

        let mut counts = BTreeMap::new();
        for (counter, after) in &self.counts {
            let prior = before.counts.get(counter).copied().unwrap_or(0);
            if prior != *after {
                counts.insert(counter.clone(), ValueChange::changed(prior, *after));
            }
        }
        for (counter, prior) in &before.counts {
            if !self.counts.contains_key(counter) && *prior != 0 {
                counts.insert(counter.clone(), ValueChange::changed(*prior, 0));
            }
        }

        let metadata_changed = self.metadata_differs(before);
        let unlock_changed = before.unlocked != self.unlocked;
        let available_changed = before.available != self.available;
        if !unlock_changed && !available_changed && counts.is_empty() && !metadata_changed {
            return None;
        }

        let state = match (before.unlocked, self.unlocked) {
            (false, true) => ProgressionDeltaState::Unlocked,
            (true, false) => ProgressionDeltaState::Locked,
            _ => ProgressionDeltaState::Changed,
        };

        Some(ProgressionDelta {
            id: self.id.clone(),
            state,
            unlocked: ValueChange::changed(before.unlocked, self.unlocked),
            available: ValueChange::changed(before.available, self.available),
            counts,
            metadata_changed,
        })
    }
}

/// Kind of change reported for one progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionDeltaState {
    /// Not present in the caller's last known snapshot
    Added,
    /// Became unlocked since the last known snapshot
    Unlocked,
    /// The caller believed it unlocked but it is not
    Locked,
    /// Counters, availability or metadata differ
    Changed,
}

/// Before/after pair. `before` is `None` for entries the caller never saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    pub before: Option<T>,
    pub after: T,
}

impl<T: PartialEq> ValueChange<T> {
    pub fn added(after: T) -> Self {
        Self {
            before: None,
            after,
        }
    }

    pub fn changed(before: T, after: T) -> Self {
        Self {
            before: Some(before),
            after,
        }
    }

    pub fn is_change(&self) -> bool {
        self.before.as_ref() != Some(&self.after)
    }
}

/// Changes to one progression across a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionDelta {
    pub id: ProgressionId,
    pub state: ProgressionDeltaState,
    pub unlocked: ValueChange<bool>,
    pub available: ValueChange<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, ValueChange<i64>>,
    #[serde(default)]
    pub metadata_changed: bool,
}
