//! Use cases - caller-facing operations.
//!
//! Each use case orchestrates the domain aggregates and the ports for one
//! operation. Use cases are grouped per area in a container held by `App`.

pub mod context;
pub mod progression;
pub mod tutorial;

mod error_code;
mod sanitize;

pub use context::{ContextError, RequestContext};
pub use error_code::ErrorCode;
pub use progression::{ProgressionError, ProgressionMap, ProgressionUseCases, ProgressionsResult};
pub use tutorial::{TutorialError, TutorialMap, TutorialUseCases};
