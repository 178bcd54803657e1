//! Career path selection
//!
//! Switching paths is a fresh start: the goal is set and every roadmap row of
//! the user is deleted, across all topics. The next dashboard load generates
//! the new roadmap.

use super::catalog::Catalog;
use crate::api::events::{Event, EventBroadcaster};
use crate::error::{PathwiseError, Result};
use crate::storage::StorageBackend;
use crate::types::UserId;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A selectable career path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CareerPath {
    /// Catalog topic key stored as the profile goal
    pub value: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const CAREER_PATHS: &[CareerPath] = &[
    CareerPath {
        value: "AI",
        title: "AI Engineer",
        description: "Machine Learning, LLMs, Neural Networks",
    },
    CareerPath {
        value: "FullStack",
        title: "Full Stack Developer",
        description: "Frontend, Backend, DevOps",
    },
    CareerPath {
        value: "DataScience",
        title: "Data Scientist",
        description: "Analytics, ML, Visualization",
    },
    CareerPath {
        value: "CyberSecurity",
        title: "Cybersecurity",
        description: "Security, Ethical Hacking",
    },
];

pub fn career_paths() -> &'static [CareerPath] {
    CAREER_PATHS
}

pub struct CareerPathService {
    catalog: Arc<Catalog>,
    storage: Arc<dyn StorageBackend>,
    events: EventBroadcaster,
}

impl CareerPathService {
    pub fn new(
        catalog: Arc<Catalog>,
        storage: Arc<dyn StorageBackend>,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            catalog,
            storage,
            events,
        }
    }

    /// Set the goal to `topic` and wipe all of the user's roadmaps in one
    /// transaction. Returns the number of modules removed.
    pub async fn select_path(&self, user_id: UserId, topic: &str) -> Result<u64> {
        let topic = topic.trim();
        if !self.catalog.contains_topic(topic) {
            let known: Vec<_> = self.catalog.topics().collect();
            return Err(PathwiseError::validation(format!(
                "Unknown career path '{}' (expected one of: {})",
                topic,
                known.join(", ")
            )));
        }

        let removed = self.storage.reset_career_path(user_id, topic).await?;
        info!(
            "{} switched career path to {} ({} modules removed)",
            user_id, topic, removed
        );

        self.events
            .broadcast(Event::roadmap_reset(user_id, topic.to_string(), removed));
        self.events.broadcast(Event::progress_updated(user_id, None));
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{create_test_storage, sample_modules, sample_profile};

    #[test]
    fn test_career_paths_are_catalog_topics() {
        let catalog = Catalog::bundled().unwrap();
        for path in career_paths() {
            assert!(catalog.contains_topic(path.value), "{} missing", path.value);
        }
    }

    #[tokio::test]
    async fn test_unknown_topic_is_rejected_without_writes() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Hedy", "AI");
        storage.create_profile(&profile).await.unwrap();
        storage
            .insert_modules(&sample_modules(profile.id, "AI", 2))
            .await
            .unwrap();

        let service = CareerPathService::new(
            Arc::new(Catalog::bundled().unwrap()),
            storage.clone(),
            EventBroadcaster::default(),
        );
        let err = service.select_path(profile.id, "Underwater Basketry").await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));
        assert_eq!(storage.list_modules(profile.id, None).await.unwrap().len(), 2);
        assert_eq!(storage.get_profile(profile.id).await.unwrap().unwrap().goal, "AI");
    }
}
