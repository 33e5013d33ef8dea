//! Tutorial catalog - validated tutorial definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Tutorial, TutorialDefinition, TutorialRecord, TutorialSnapshot};
use crate::error::DomainError;
use crate::ids::TutorialId;

/// Root of a tutorials configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialsConfig {
    #[serde(default)]
    pub tutorials: BTreeMap<TutorialId, TutorialDefinition>,
}

/// Immutable, process-wide set of tutorial definitions.
#[derive(Debug, Clone, Default)]
pub struct TutorialCatalog {
    tutorials: BTreeMap<TutorialId, TutorialDefinition>,
}

impl TutorialCatalog {
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if any tutorial starts after its
    /// last step.
    pub fn from_config(config: TutorialsConfig) -> Result<Self, DomainError> {
        for (id, definition) in &config.tutorials {
            if definition.start_step > definition.max_step {
                return Err(DomainError::configuration(format!(
                    "tutorial '{id}' starts at step {} beyond its max step {}",
                    definition.start_step, definition.max_step
                )));
            }
        }
        Ok(Self {
            tutorials: config.tutorials,
        })
    }

    pub fn to_config(&self) -> TutorialsConfig {
        TutorialsConfig {
            tutorials: self.tutorials.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.tutorials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tutorials.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<(&TutorialId, &TutorialDefinition)> {
        self.tutorials.get_key_value(id)
    }

    /// Stored record for a tutorial, or a fresh one if the user never touched it.
    pub fn record_for(
        &self,
        snapshot: &TutorialSnapshot,
        id: &TutorialId,
        definition: &TutorialDefinition,
    ) -> TutorialRecord {
        snapshot
            .tutorials
            .get(id)
            .cloned()
            .unwrap_or_else(|| TutorialRecord::new(definition))
    }

    /// Views of every defined tutorial for one user.
    pub fn views(&self, snapshot: &TutorialSnapshot) -> BTreeMap<TutorialId, Tutorial> {
        self.tutorials
            .iter()
            .map(|(id, definition)| {
                let record = self.record_for(snapshot, id, definition);
                (id.clone(), Tutorial::from_parts(id.clone(), definition, &record))
            })
            .collect()
    }
}
