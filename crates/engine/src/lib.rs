//! Milestones Engine library.
//!
//! Per-user progressions and tutorials over pluggable stores.
//!
//! ## Structure
//!
//! - `use_cases/` - Caller-facing operations (Get, Purchase, Update, ...)
//! - `infrastructure/` - Port traits, in-memory adapters, config loading
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures module for integration testing.
#[cfg(test)]
pub mod test_fixtures;

/// End-to-end flows over the in-memory adapters.
#[cfg(test)]
mod e2e_tests;

pub use app::{App, InMemoryAdapters, Ports};
