//! Precondition trees - what must hold before a progression unlocks
//!
//! A block combines a set of direct conditions with an optional nested block
//! through a boolean operator. Direct conditions are ANDed together:
//! - `counts` - thresholds on the progression's own counters
//! - `cost` - the price paid through a purchase
//! - `progressions` - other progressions that must be unlocked
//! - `progression_counts` - counters of other progressions that must reach a minimum
//!
//! The tree is the configuration shape. Catalogs compile it into index-based
//! terms once at load time; nothing here is evaluated per call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ProgressionId;

/// How a block's direct conditions combine with its nested block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionOperator {
    /// Both must hold
    #[default]
    #[serde(alias = "AND")]
    And,
    /// Either may hold
    #[serde(alias = "OR")]
    Or,
    /// Exactly one holds
    #[serde(alias = "XOR")]
    Xor,
    /// Direct holds and nested does not
    #[serde(alias = "NOT")]
    Not,
}

impl PreconditionOperator {
    /// Combine the direct and nested results.
    pub fn combine(self, direct: bool, nested: bool) -> bool {
        match self {
            Self::And => direct && nested,
            Self::Or => direct || nested,
            Self::Xor => direct ^ nested,
            Self::Not => direct && !nested,
        }
    }
}

impl std::fmt::Display for PreconditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Price of a purchasable progression, charged through the wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionCost {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub currencies: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<String, i64>,
}

impl ProgressionCost {
    /// True when nothing would actually be charged.
    pub fn is_free(&self) -> bool {
        self.currencies
            .values()
            .chain(self.items.values())
            .all(|amount| *amount == 0)
    }

    /// Iterate every amount in the cost, currencies first.
    pub fn amounts(&self) -> impl Iterator<Item = (&str, i64)> {
        self.currencies
            .iter()
            .chain(self.items.iter())
            .map(|(k, v)| (k.as_str(), *v))
    }
}

/// A counter on another progression that must reach `min`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRequirement {
    pub progression: ProgressionId,
    pub counter: String,
    pub min: i64,
}

/// Conditions that are ANDed together inside a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preconditions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<ProgressionCost>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progressions: Vec<ProgressionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progression_counts: Vec<CountRequirement>,
}

impl Preconditions {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
            && self.cost.is_none()
            && self.progressions.is_empty()
            && self.progression_counts.is_empty()
    }

    /// Other progressions referenced by these conditions.
    pub fn referenced_progressions(&self) -> impl Iterator<Item = &ProgressionId> {
        self.progressions
            .iter()
            .chain(self.progression_counts.iter().map(|req| &req.progression))
    }
}

/// A node of the precondition tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionsBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<Preconditions>,
    #[serde(default)]
    pub operator: PreconditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<PreconditionsBlock>>,
}

impl PreconditionsBlock {
    /// A block holding only direct conditions.
    pub fn direct(conditions: Preconditions) -> Self {
        Self {
            direct: Some(conditions),
            operator: PreconditionOperator::And,
            nested: None,
        }
    }

    /// Attach a nested block under the given operator.
    pub fn with_nested(mut self, operator: PreconditionOperator, nested: PreconditionsBlock) -> Self {
        self.operator = operator;
        self.nested = Some(Box::new(nested));
        self
    }

    /// Direct conditions of this block and every nested block, outermost first.
    pub fn levels(&self) -> impl Iterator<Item = &Preconditions> {
        std::iter::successors(Some(self), |block| block.nested.as_deref())
            .filter_map(|block| block.direct.as_ref())
    }

    /// Every progression referenced anywhere in the tree.
    pub fn referenced_progressions(&self) -> Vec<&ProgressionId> {
        self.levels()
            .flat_map(Preconditions::referenced_progressions)
            .collect()
    }

    /// Highest threshold per own counter across the tree.
    pub fn count_thresholds(&self) -> BTreeMap<String, i64> {
        let mut thresholds: BTreeMap<String, i64> = BTreeMap::new();
        for (counter, threshold) in self.levels().flat_map(|level| level.counts.iter()) {
            let entry = thresholds.entry(counter.clone()).or_insert(*threshold);
            *entry = (*entry).max(*threshold);
        }
        thresholds
    }

    /// Every cost in the tree. Valid configurations carry at most one.
    pub fn costs(&self) -> Vec<&ProgressionCost> {
        self.levels().filter_map(|level| level.cost.as_ref()).collect()
    }
}
