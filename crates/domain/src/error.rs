//! Domain errors
//!
//! Configuration problems (cycles, dangling references, impossible limits)
//! are detected once when a catalog is built and reported as
//! `DomainError::Configuration`; they are fatal at startup. The other
//! variants come from per-call operations and are mapped to caller-facing
//! error kinds by the engine.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Identifier was empty or too long
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Lookup inside an aggregate failed (e.g. a counter the progression
    /// does not track)
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Definitions failed load-time validation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record is in a state that forbids the operation
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// # Example
    /// ```ignore
    /// if visiting.contains(&id) {
    ///     return Err(DomainError::configuration(format!("cycle through {id}")));
    /// }
    /// ```
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = DomainError::not_found("Counter", "deaths");
        assert_eq!(err.to_string(), "Counter 'deaths' not found");
    }

    #[test]
    fn configuration_is_detectable() {
        let err = DomainError::configuration("cycle detected: a -> b -> a");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: cycle detected: a -> b -> a"
        );
    }

    #[test]
    fn state_transition_is_not_configuration() {
        let err = DomainError::invalid_state_transition("tutorial was declined");
        assert!(!err.is_configuration());
        assert!(err.to_string().starts_with("Invalid state transition"));
    }
}
