//! Process settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROGRESSION_CONFIG_PATH: &str = "config/progressions.json";
pub const DEFAULT_TUTORIALS_CONFIG_PATH: &str = "config/tutorials.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub progression_config_path: PathBuf,
    pub tutorials_config_path: PathBuf,
    /// Deadline applied to requests that arrive without one.
    pub request_timeout: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            progression_config_path: PathBuf::from(DEFAULT_PROGRESSION_CONFIG_PATH),
            tutorials_config_path: PathBuf::from(DEFAULT_TUTORIALS_CONFIG_PATH),
            request_timeout: None,
        }
    }
}

impl EngineSettings {
    /// Read `PROGRESSION_CONFIG_PATH`, `TUTORIALS_CONFIG_PATH` and
    /// `REQUEST_TIMEOUT_MS`. Call after the dotenv files are loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let request_timeout = non_empty("REQUEST_TIMEOUT_MS").and_then(|raw| match raw.parse::<u64>() {
            Ok(0) => None,
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "Ignoring invalid REQUEST_TIMEOUT_MS");
                None
            }
        });

        Self {
            progression_config_path: non_empty("PROGRESSION_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.progression_config_path),
            tutorials_config_path: non_empty("TUTORIALS_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tutorials_config_path),
            request_timeout,
        }
    }
}
