extern crate self as milestones_domain;

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use aggregates::{
    CatalogEntry, ProgressionCatalog, ProgressionConfig, ProgressionLedger, TutorialCatalog,
    TutorialsConfig,
};

pub use entities::{
    Progression, ProgressionDefinition, ProgressionDelta, ProgressionDeltaState,
    ProgressionRecord, ProgressionSnapshot, Tutorial, TutorialDefinition, TutorialRecord,
    TutorialSnapshot, TutorialState, ValueChange,
};

pub use error::DomainError;

pub use ids::{ProgressionId, TutorialId, UserId};

pub use value_objects::{
    CountRequirement, PreconditionOperator, Preconditions, PreconditionsBlock, ProgressionCost,
};
