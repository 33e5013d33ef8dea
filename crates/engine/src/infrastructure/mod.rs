//! Infrastructure implementations.
//!
//! Contains port trait implementations and process-level plumbing.

pub mod catalog_loader;
pub mod clock;
pub mod correlation;
pub mod memory;
pub mod ports;
pub mod settings;
