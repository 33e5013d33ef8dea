//! Value objects - Immutable objects defined by their attributes

mod preconditions;

pub use preconditions::{
    CountRequirement, PreconditionOperator, Preconditions, PreconditionsBlock, ProgressionCost,
};
