//! Test fixtures: sample catalogs and helpers shared by use-case tests.
//!
//! The JSON files under `test_data/` are the same shape as production
//! configuration files.

use std::path::PathBuf;
use std::sync::Arc;

use milestones_domain::{
    ProgressionCatalog, ProgressionConfig, TutorialCatalog, TutorialsConfig, UserId,
};

pub const PROGRESSIONS_JSON: &str = include_str!("../../test_data/progressions.json");
pub const TUTORIALS_JSON: &str = include_str!("../../test_data/tutorials.json");

/// Path to a file under `test_data/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}

/// Catalog built from `test_data/progressions.json`.
///
/// # Panics
///
/// Panics if the fixture is invalid.
pub fn progression_catalog() -> Arc<ProgressionCatalog> {
    let config: ProgressionConfig =
        serde_json::from_str(PROGRESSIONS_JSON).expect("progressions fixture parses");
    Arc::new(ProgressionCatalog::from_config(config).expect("progressions fixture is valid"))
}

/// Catalog built from `test_data/tutorials.json`.
///
/// # Panics
///
/// Panics if the fixture is invalid.
pub fn tutorial_catalog() -> Arc<TutorialCatalog> {
    let config: TutorialsConfig =
        serde_json::from_str(TUTORIALS_JSON).expect("tutorials fixture parses");
    Arc::new(TutorialCatalog::from_config(config).expect("tutorials fixture is valid"))
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}
