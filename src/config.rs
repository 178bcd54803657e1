//! Layered configuration for PathWise
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `pathwise.toml` in the working directory)
//! 3. `PATHWISE__SECTION__KEY` environment variables

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pathwise.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathwiseConfig {
    pub database: DatabaseConfig,
    pub predictor: PredictorConfig,
    pub catalog: CatalogConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub events: EventConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Local path or `libsql://` URL; resolved by the CLI when unset
    pub url: Option<String>,
}

/// Difficulty predictor endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Difficulty used when the predictor call fails
    pub fallback_difficulty: i64,
    /// Propagate predictor failures instead of using the fallback
    pub fail_on_error: bool,
}

impl PredictorConfig {
    pub fn fallback(&self) -> Option<i64> {
        if self.fail_on_error {
            None
        } else {
            Some(self.fallback_difficulty)
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            fallback_difficulty: 0,
            fail_on_error: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Replaces the bundled learning path catalog when set
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast channel capacity
    pub capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

impl PathwiseConfig {
    /// Load configuration from an explicit file (required) or the default file (optional)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                File::from(path).required(true)
            }
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PATHWISE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a TOML string (no environment overlay)
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PathwiseConfig::default();
        assert_eq!(config.predictor.base_url, "http://localhost:8000");
        assert_eq!(config.predictor.fallback(), Some(0));
        assert_eq!(config.api.addr, "127.0.0.1:3000");
        assert_eq!(config.events.capacity, 1000);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PathwiseConfig::from_toml_str(
            r#"
            [predictor]
            base_url = "http://predictor.internal:9000"

            fail_on_error = true

            [auth]
            session_ttl_hours = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.predictor.base_url, "http://predictor.internal:9000");
        assert_eq!(config.predictor.timeout_secs, 10);
        assert_eq!(config.predictor.fallback(), None);
        assert_eq!(config.auth.session_ttl_hours, 12);
        assert_eq!(config.events.capacity, 1000);
    }
}
