//! Aggregates - validated catalogs and the per-user working state built on them

mod progression_catalog;
mod progression_ledger;
mod tutorial_catalog;

pub use progression_catalog::{CatalogEntry, ProgressionCatalog, ProgressionConfig};
pub use progression_ledger::ProgressionLedger;
pub use tutorial_catalog::{TutorialCatalog, TutorialsConfig};
