//! Static learning path catalog
//!
//! `{topic: {beginner|intermediate|advanced: [step, ...]}}`. A copy ships
//! with the crate; `catalog.path` in the configuration replaces it.

use crate::config::CatalogConfig;
use crate::error::{PathwiseError, Result};
use crate::types::{ModuleType, Resources};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const BUNDLED_CATALOG: &str = include_str!("../../data/learning_paths.json");

/// Catalog level selected from a predicted difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    /// 0 is beginner, 1 intermediate, anything else advanced
    pub fn from_difficulty(difficulty: i64) -> Self {
        match difficulty {
            0 => DifficultyLevel::Beginner,
            1 => DifficultyLevel::Intermediate,
            _ => DifficultyLevel::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

/// One step of a learning path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStep {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_step_type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub resources: Resources,
}

fn default_step_type() -> ModuleType {
    ModuleType::Learning
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicLevels {
    #[serde(default)]
    pub beginner: Vec<CatalogStep>,
    #[serde(default)]
    pub intermediate: Vec<CatalogStep>,
    #[serde(default)]
    pub advanced: Vec<CatalogStep>,
}

impl TopicLevels {
    pub fn level(&self, level: DifficultyLevel) -> &[CatalogStep] {
        match level {
            DifficultyLevel::Beginner => &self.beginner,
            DifficultyLevel::Intermediate => &self.intermediate,
            DifficultyLevel::Advanced => &self.advanced,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    topics: BTreeMap<String, TopicLevels>,
}

impl Catalog {
    /// Catalog shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PathwiseError::Catalog(format!("Invalid catalog document: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading catalog from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|e| {
            PathwiseError::Catalog(format!("Cannot read catalog {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Configured catalog, or the bundled one
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        let catalog = match &config.path {
            Some(path) => Self::from_path(path)?,
            None => Self::bundled()?,
        };
        info!("Catalog loaded with {} topics", catalog.topics.len());
        Ok(catalog)
    }

    /// Steps for a topic and level; empty when either is absent
    pub fn steps(&self, topic: &str, level: DifficultyLevel) -> &[CatalogStep] {
        self.topics
            .get(topic)
            .map(|levels| levels.level(level))
            .unwrap_or(&[])
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }
}
