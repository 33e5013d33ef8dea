//! Progression catalog - validated, index-based form of the configuration
//!
//! Definitions are stored in an arena ordered by id. Every precondition
//! reference is resolved to an arena index when the catalog is built, and a
//! topological evaluation order is computed once. A catalog therefore never
//! contains dangling references or cycles, and reconciling a user costs one
//! pass over the arena.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entities::{ProgressionDefinition, ProgressionRecord};
use crate::error::DomainError;
use crate::ids::ProgressionId;
use crate::value_objects::{PreconditionOperator, PreconditionsBlock, ProgressionCost};

/// Root of a progression configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub progressions: BTreeMap<ProgressionId, ProgressionDefinition>,
}

/// A single compiled condition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Unlocked(usize),
    CountAtLeast {
        progression: usize,
        counter: String,
        min: i64,
    },
    OwnCount {
        counter: String,
        min: i64,
    },
    Cost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledBlock {
    direct: Vec<Term>,
    operator: PreconditionOperator,
    nested: Option<Box<CompiledBlock>>,
}

/// Which question an evaluation answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Evaluation {
    /// Does the progression unlock right now?
    Unlock,
    /// Do the conditions on *other* progressions hold? The progression's own
    /// counters and cost count as satisfied.
    Gates,
    /// Could the progression be bought right now? Only the cost counts as
    /// satisfied; own counters must have reached their thresholds.
    Purchase,
}

/// One validated definition plus its compiled preconditions.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    id: ProgressionId,
    definition: ProgressionDefinition,
    preconditions: Option<CompiledBlock>,
    counters: BTreeMap<String, i64>,
    cost: Option<ProgressionCost>,
}

impl CatalogEntry {
    pub fn id(&self) -> &ProgressionId {
        &self.id
    }

    pub fn definition(&self) -> &ProgressionDefinition {
        &self.definition
    }

    /// Maximum per tracked counter.
    pub fn counters(&self) -> &BTreeMap<String, i64> {
        &self.counters
    }

    pub fn has_counters(&self) -> bool {
        !self.counters.is_empty()
    }

    pub fn cost(&self) -> Option<&ProgressionCost> {
        self.cost.as_ref()
    }

    pub fn is_purchasable(&self) -> bool {
        self.cost.is_some()
    }
}

/// Immutable, process-wide set of progression definitions.
#[derive(Debug, Clone)]
pub struct ProgressionCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ProgressionId, usize>,
    order: Vec<usize>,
}

impl ProgressionCatalog {
    /// Validate a configuration and build the catalog.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` for unknown or self references,
    /// count requirements on a counter the target does not track, dependency
    /// cycles, negative amounts, more than one cost in a tree, or a threshold
    /// above its counter's maximum.
    pub fn from_config(config: ProgressionConfig) -> Result<Self, DomainError> {
        let index: HashMap<ProgressionId, usize> = config
            .progressions
            .keys()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();

        let mut prepared = Vec::with_capacity(config.progressions.len());
        for (id, definition) in config.progressions {
            let (counters, cost) = own_counters_and_cost(&id, &definition)?;
            prepared.push((id, definition, counters, cost));
        }

        // Count requirements on other progressions are checked against the
        // target's counters, so every entry's counters must be known first.
        let all_counters: Vec<&BTreeMap<String, i64>> =
            prepared.iter().map(|(_, _, counters, _)| counters).collect();
        let mut compiled = Vec::with_capacity(prepared.len());
        let mut dependencies: Vec<BTreeSet<usize>> = Vec::with_capacity(prepared.len());
        for (own, (id, definition, _, _)) in prepared.iter().enumerate() {
            let mut deps = BTreeSet::new();
            let block = match &definition.preconditions {
                Some(block) => Some(compile_block(id, own, block, &index, &all_counters, &mut deps)?),
                None => None,
            };
            compiled.push(block);
            dependencies.push(deps);
        }

        let entries: Vec<CatalogEntry> = prepared
            .into_iter()
            .zip(compiled)
            .map(|((id, definition, counters, cost), preconditions)| CatalogEntry {
                id,
                definition,
                preconditions,
                counters,
                cost,
            })
            .collect();

        let order = evaluation_order(&entries, &dependencies)?;
        Ok(Self {
            entries,
            index,
            order,
        })
    }

    /// Rebuild the configuration this catalog was created from.
    pub fn to_config(&self) -> ProgressionConfig {
        ProgressionConfig {
            progressions: self
                .entries
                .iter()
                .map(|entry| (entry.id.clone(), entry.definition.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn entry(&self, idx: usize) -> &CatalogEntry {
        &self.entries[idx]
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index_of(id).map(|idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Arena indices in dependency order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Ids in dependency order: every progression after the ones it references.
    pub fn evaluation_order(&self) -> Vec<&ProgressionId> {
        self.order.iter().map(|idx| &self.entries[*idx].id).collect()
    }

    /// Evaluate a progression's preconditions against ledger records aligned
    /// with this catalog's arena. No preconditions always holds.
    pub(crate) fn evaluate(&self, idx: usize, records: &[ProgressionRecord], mode: Evaluation) -> bool {
        match &self.entries[idx].preconditions {
            Some(block) => evaluate_block(block, idx, records, mode),
            None => true,
        }
    }
}

/// Tracked counters (with their maxima) and the cost of one definition.
fn own_counters_and_cost(
    id: &ProgressionId,
    definition: &ProgressionDefinition,
) -> Result<(BTreeMap<String, i64>, Option<ProgressionCost>), DomainError> {
    if let Some((counter, _)) = definition.max_counts.iter().find(|(_, max)| **max < 0) {
        return Err(DomainError::configuration(format!(
            "progression '{id}' has a negative maximum for counter '{counter}'"
        )));
    }

    let Some(block) = &definition.preconditions else {
        return Ok((definition.max_counts.clone(), None));
    };

    let costs = block.costs();
    if costs.len() > 1 {
        return Err(DomainError::configuration(format!(
            "progression '{id}' declares more than one cost"
        )));
    }
    let cost = costs.first().map(|cost| (*cost).clone());
    if let Some(cost) = &cost {
        if let Some((currency, _)) = cost.amounts().find(|(_, amount)| *amount < 0) {
            return Err(DomainError::configuration(format!(
                "progression '{id}' has a negative cost for '{currency}'"
            )));
        }
    }

    let mut counters = definition.max_counts.clone();
    for (counter, threshold) in &block.count_thresholds() {
        if *threshold < 0 {
            return Err(DomainError::configuration(format!(
                "progression '{id}' has a negative threshold for counter '{counter}'"
            )));
        }
        match counters.get(counter) {
            Some(max) if max < threshold => {
                return Err(DomainError::configuration(format!(
                    "progression '{id}' can never reach {threshold} '{counter}' with a maximum of {max}"
                )));
            }
            Some(_) => {}
            None => {
                counters.insert(counter.clone(), *threshold);
            }
        }
    }
    Ok((counters, cost))
}

fn compile_block(
    id: &ProgressionId,
    own: usize,
    block: &PreconditionsBlock,
    index: &HashMap<ProgressionId, usize>,
    counters: &[&BTreeMap<String, i64>],
    deps: &mut BTreeSet<usize>,
) -> Result<CompiledBlock, DomainError> {
    let resolve = |target: &ProgressionId, deps: &mut BTreeSet<usize>| -> Result<usize, DomainError> {
        let target_idx = index.get(target).copied().ok_or_else(|| {
            DomainError::configuration(format!(
                "progression '{id}' references unknown progression '{target}'"
            ))
        })?;
        if target_idx == own {
            return Err(DomainError::configuration(format!(
                "progression '{id}' cannot depend on itself"
            )));
        }
        deps.insert(target_idx);
        Ok(target_idx)
    };

    let mut direct = Vec::new();
    if let Some(conditions) = &block.direct {
        for (counter, min) in &conditions.counts {
            direct.push(Term::OwnCount {
                counter: counter.clone(),
                min: *min,
            });
        }
        if conditions.cost.is_some() {
            direct.push(Term::Cost);
        }
        for target in &conditions.progressions {
            direct.push(Term::Unlocked(resolve(target, deps)?));
        }
        for requirement in &conditions.progression_counts {
            if requirement.min < 0 {
                return Err(DomainError::configuration(format!(
                    "progression '{id}' requires a negative '{}' count on '{}'",
                    requirement.counter, requirement.progression
                )));
            }
            let target = resolve(&requirement.progression, deps)?;
            match counters[target].get(&requirement.counter) {
                None => {
                    return Err(DomainError::configuration(format!(
                        "progression '{id}' references unknown counter '{}' on '{}'",
                        requirement.counter, requirement.progression
                    )));
                }
                Some(max) if *max < requirement.min => {
                    return Err(DomainError::configuration(format!(
                        "progression '{id}' requires {} '{}' on '{}', which has a maximum of {max}",
                        requirement.min, requirement.counter, requirement.progression
                    )));
                }
                Some(_) => {}
            }
            direct.push(Term::CountAtLeast {
                progression: target,
                counter: requirement.counter.clone(),
                min: requirement.min,
            });
        }
    }

    let nested = match &block.nested {
        Some(nested) => Some(Box::new(compile_block(id, own, nested, index, counters, deps)?)),
        None => None,
    };

    Ok(CompiledBlock {
        direct,
        operator: block.operator,
        nested,
    })
}

/// Kahn's algorithm; ties resolve to the lowest arena index (i.e. by id), so
/// the same configuration always yields the same order.
fn evaluation_order(
    entries: &[CatalogEntry],
    dependencies: &[BTreeSet<usize>],
) -> Result<Vec<usize>, DomainError> {
    let mut remaining: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for (idx, deps) in dependencies.iter().enumerate() {
        for dep in deps {
            dependents[*dep].push(idx);
        }
    }

    let mut ready: BTreeSet<usize> = (0..entries.len()).filter(|idx| remaining[*idx] == 0).collect();
    let mut order = Vec::with_capacity(entries.len());
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for dependent in &dependents[idx] {
            remaining[*dependent] -= 1;
            if remaining[*dependent] == 0 {
                ready.insert(*dependent);
            }
        }
    }

    if order.len() < entries.len() {
        let cyclic: Vec<&str> = (0..entries.len())
            .filter(|idx| remaining[*idx] > 0)
            .map(|idx| entries[idx].id.as_str())
            .collect();
        return Err(DomainError::configuration(format!(
            "precondition cycle between progressions: {}",
            cyclic.join(", ")
        )));
    }

    Ok(order)
}

fn evaluate_block(block: &CompiledBlock, own: usize, records: &[ProgressionRecord], mode: Evaluation) -> bool {
    let direct = block
        .direct
        .iter()
        .all(|term| evaluate_term(term, own, records, mode));
    match &block.nested {
        Some(nested) => block
            .operator
            .combine(direct, evaluate_block(nested, own, records, mode)),
        None => direct,
    }
}

fn evaluate_term(term: &Term, own: usize, records: &[ProgressionRecord], mode: Evaluation) -> bool {
    match term {
        Term::Unlocked(idx) => records[*idx].unlocked,
        Term::CountAtLeast {
            progression,
            counter,
            min,
        } => records[*progression].count(counter) >= *min,
        Term::OwnCount { counter, min } => match mode {
            Evaluation::Gates => true,
            Evaluation::Unlock | Evaluation::Purchase => records[own].count(counter) >= *min,
        },
        // Purchases unlock directly, so the cost only "holds" once unlocked.
        Term::Cost => match mode {
            Evaluation::Gates | Evaluation::Purchase => true,
            Evaluation::Unlock => records[own].unlocked,
        },
    }
}
