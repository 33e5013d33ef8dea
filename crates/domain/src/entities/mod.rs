//! Domain entities - Core business objects with identity

mod progression;
mod tutorial;

pub use progression::{
    Progression, ProgressionDefinition, ProgressionDelta, ProgressionDeltaState,
    ProgressionRecord, ProgressionSnapshot, ValueChange,
};
pub use tutorial::{
    Tutorial, TutorialDefinition, TutorialRecord, TutorialSnapshot, TutorialState,
};
