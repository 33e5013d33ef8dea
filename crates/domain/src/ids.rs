//! Identifier newtypes.
//!
//! Progression and tutorial identifiers are the keys used in configuration
//! files, and user identifiers come from the hosting runtime, so all three are
//! validated strings rather than generated UUIDs.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum length for any identifier.
const MAX_ID_LENGTH: usize = 128;

macro_rules! define_key {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a validated identifier (non-empty, trimmed, bounded length).
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(concat!($label, " cannot be empty")));
                }
                if trimmed.len() > MAX_ID_LENGTH {
                    return Err(DomainError::invalid_id(format!(
                        concat!($label, " cannot exceed {} characters"),
                        MAX_ID_LENGTH
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }
    };
}

define_key!(UserId, "User ID");
define_key!(ProgressionId, "Progression ID");
define_key!(TutorialId, "Tutorial ID");
