//! Tutorial entity - step counter with a small lifecycle
//!
//! ```text
//! NotStarted -> Accepted -> InProgress -> Completed
//!      |            |            |
//!      +------------+------------+--> Declined | Abandoned
//! ```
//!
//! Accept/Decline/Abandon set the state directly. Only `advance` moves the
//! step, and it refuses to touch a tutorial that was declined, abandoned or
//! already completed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::TutorialId;

/// Configuration for a single tutorial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialDefinition {
    #[serde(default)]
    pub start_step: u32,
    pub max_step: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_properties: BTreeMap<String, String>,
}

impl TutorialDefinition {
    pub fn new(start_step: u32, max_step: u32) -> Self {
        Self {
            start_step,
            max_step,
            additional_properties: BTreeMap::new(),
        }
    }

    pub fn clamp_step(&self, step: u32) -> u32 {
        step.clamp(self.start_step, self.max_step)
    }
}

/// Lifecycle of a tutorial for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorialState {
    #[default]
    NotStarted,
    Accepted,
    InProgress,
    Declined,
    Abandoned,
    Completed,
}

impl TutorialState {
    /// States from which the step can no longer move.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Abandoned | Self::Completed)
    }
}

impl std::fmt::Display for TutorialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Accepted => write!(f, "accepted"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Declined => write!(f, "declined"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Stored per-user state for one tutorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialRecord {
    pub state: TutorialState,
    pub step: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TutorialRecord {
    /// Fresh record positioned at the definition's first step.
    pub fn new(definition: &TutorialDefinition) -> Self {
        Self {
            state: TutorialState::NotStarted,
            step: definition.start_step,
            updated_at: None,
        }
    }

    /// Accept the tutorial. A terminal tutorial restarts from its first step.
    pub fn accept(&mut self, definition: &TutorialDefinition, now: DateTime<Utc>) {
        if self.state.is_terminal() {
            self.step = definition.start_step;
        }
        self.state = TutorialState::Accepted;
        self.updated_at = Some(now);
    }

    pub fn decline(&mut self, now: DateTime<Utc>) {
        self.state = TutorialState::Declined;
        self.updated_at = Some(now);
    }

    pub fn abandon(&mut self, now: DateTime<Utc>) {
        self.state = TutorialState::Abandoned;
        self.updated_at = Some(now);
    }

    /// Move to `step`, clamped to the definition's bounds and never backward.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` when the tutorial is
    /// declined, abandoned or completed.
    pub fn advance(
        &mut self,
        definition: &TutorialDefinition,
        step: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.state.is_terminal() {
            return Err(DomainError::invalid_state_transition(format!(
                "cannot update a tutorial that is {}",
                self.state
            )));
        }

        let current = definition.clamp_step(self.step);
        self.step = definition.clamp_step(step).max(current);
        self.state = if self.step == definition.max_step {
            TutorialState::Completed
        } else {
            TutorialState::InProgress
        };
        self.updated_at = Some(now);
        Ok(())
    }
}

/// Caller-facing view of a tutorial for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: TutorialId,
    pub state: TutorialState,
    pub current_step: u32,
    pub start_step: u32,
    pub max_step: u32,
    #[serde(default)]
    pub additional_properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tutorial {
    pub fn from_parts(id: TutorialId, definition: &TutorialDefinition, record: &TutorialRecord) -> Self {
        Self {
            id,
            state: record.state,
            current_step: definition.clamp_step(record.step),
            start_step: definition.start_step,
            max_step: definition.max_step,
            additional_properties: definition.additional_properties.clone(),
            updated_at: record.updated_at,
        }
    }
}

/// Everything the store keeps for one user's tutorials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialSnapshot {
    #[serde(default)]
    pub tutorials: BTreeMap<TutorialId, TutorialRecord>,
}
