//! JSON configuration files -> validated catalogs.
//!
//! Both files are read once at startup. Any error here is fatal: a process
//! must never serve requests from a partially valid catalog.

use std::path::{Path, PathBuf};

use milestones_domain::{
    DomainError, ProgressionCatalog, ProgressionConfig, TutorialCatalog, TutorialsConfig,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Configuration {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

async fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogLoadError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| CatalogLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn load_progression_catalog(path: &Path) -> Result<ProgressionCatalog, CatalogLoadError> {
    let config: ProgressionConfig = read_config(path).await?;
    let catalog =
        ProgressionCatalog::from_config(config).map_err(|source| CatalogLoadError::Configuration {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        progressions = catalog.len(),
        "Loaded progression catalog"
    );
    Ok(catalog)
}

pub async fn load_tutorial_catalog(path: &Path) -> Result<TutorialCatalog, CatalogLoadError> {
    let config: TutorialsConfig = read_config(path).await?;
    let catalog =
        TutorialCatalog::from_config(config).map_err(|source| CatalogLoadError::Configuration {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        tutorials = catalog.len(),
        "Loaded tutorial catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{fixture_path, PROGRESSIONS_JSON};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_valid_progressions() {
        let file = write_temp(PROGRESSIONS_JSON);
        let catalog = load_progression_catalog(file.path()).await.unwrap();

        assert!(catalog.get("first_steps").is_some());
        let order: Vec<&str> = catalog.evaluation_order().iter().map(|id| id.as_str()).collect();
        let p1 = order.iter().position(|id| *id == "p1").unwrap();
        let p2 = order.iter().position(|id| *id == "p2").unwrap();
        assert!(p1 < p2, "dependencies evaluate first: {order:?}");
    }

    #[tokio::test]
    async fn loads_valid_tutorials() {
        let catalog = load_tutorial_catalog(&fixture_path("tutorials.json"))
            .await
            .unwrap();
        assert!(catalog.get("intro").is_some());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_progression_catalog(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogLoadError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let file = write_temp("{ \"progressions\": [");
        let err = load_progression_catalog(file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogLoadError::Parse { .. }));
    }

    #[tokio::test]
    async fn unknown_reference_is_configuration_error() {
        let file = write_temp(
            r#"{ "progressions": { "a": { "name": "A", "preconditions": {
                "direct": { "progressions": ["ghost"] } } } } }"#,
        );
        let err = load_progression_catalog(file.path()).await.unwrap_err();
        match err {
            CatalogLoadError::Configuration { source, .. } => assert!(source.is_configuration()),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inverted_tutorial_bounds_are_rejected() {
        let file = write_temp(r#"{ "tutorials": { "t": { "start_step": 5, "max_step": 1 } } }"#);
        let err = load_tutorial_catalog(file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogLoadError::Configuration { .. }));
    }
}
