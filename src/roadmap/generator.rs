//! Catalog-driven roadmap generation

use super::catalog::{Catalog, DifficultyLevel};
use crate::api::events::{Event, EventBroadcaster};
use crate::error::{PathwiseError, Result};
use crate::storage::StorageBackend;
use crate::types::{ModuleId, RoadmapModule, UserId};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Difficulty of a roadmap the user picked by hand
pub const REPLACEMENT_DIFFICULTY: i64 = 0;

/// Outcome of [`RoadmapGenerator::replace`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacedRoadmap {
    /// Modules deleted across every topic
    pub removed: u64,
    pub modules: Vec<RoadmapModule>,
}

pub struct RoadmapGenerator {
    catalog: Arc<Catalog>,
    storage: Arc<dyn StorageBackend>,
    events: EventBroadcaster,
}

impl RoadmapGenerator {
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

    /// Modules for `catalog[topic][level(difficulty)]` in step order.
    ///
    /// Only the first module is unlocked; every module carries the raw
    /// difficulty. Empty when the catalog has no entry.
    pub fn plan(&self, user_id: UserId, topic: &str, difficulty: i64) -> Vec<RoadmapModule> {
        let level = DifficultyLevel::from_difficulty(difficulty);
        let created_at = Utc::now();
        self.catalog
            .steps(topic, level)
            .iter()
            .enumerate()
            .map(|(index, step)| RoadmapModule {
                id: ModuleId::new(),
                user_id,
                topic: topic.to_string(),
                order_index: index as i64,
                title: step.title.clone(),
                description: step.description.clone(),
                module_type: step.module_type,
                resources: step.resources.clone(),
                is_completed: false,
                is_unlocked: index == 0,
                difficulty,
                created_at,
            })
            .collect()
    }

    /// Plan and insert all modules in one transaction.
    ///
    /// A missing catalog entry is a silent no-op returning no modules.
    pub async fn generate(
        &self,
        user_id: UserId,
        topic: &str,
        difficulty: i64,
    ) -> Result<Vec<RoadmapModule>> {
        let modules = self.plan(user_id, topic, difficulty);
        if modules.is_empty() {
            debug!(
                "No catalog entry for topic '{}' at {} level, nothing generated",
                topic,
                DifficultyLevel::from_difficulty(difficulty).as_str()
            );
            return Ok(modules);
        }

        self.storage.insert_modules(&modules).await?;
        info!(
            "Generated {} modules of '{}' for {} (difficulty {})",
            modules.len(),
            topic,
            user_id,
            difficulty
        );
        self.events.broadcast(Event::roadmap_generated(
            user_id,
            topic.to_string(),
            modules.len(),
            difficulty,
        ));
        Ok(modules)
    }

    /// Swap every roadmap of the user for the beginner steps of `topic`.
    ///
    /// The goal stays as it is; the dashboard falls back to the first topic
    /// the user has when the goal has no modules.
    pub async fn replace(&self, user_id: UserId, topic: &str) -> Result<ReplacedRoadmap> {
        let topic = topic.trim();
        if !self.catalog.contains_topic(topic) {
            return Err(PathwiseError::validation(format!("Unknown topic '{}'", topic)));
        }
        let modules = self.plan(user_id, topic, REPLACEMENT_DIFFICULTY);
        if modules.is_empty() {
            return Err(PathwiseError::validation(format!(
                "Topic '{}' has no beginner steps",
                topic
            )));
        }

        let removed = self.storage.replace_roadmap(user_id, &modules).await?;
        info!(
            "Replaced roadmap of {} with {} modules of '{}' ({} removed)",
            user_id,
            modules.len(),
            topic,
            removed
        );

        self.events
            .broadcast(Event::roadmap_reset(user_id, topic.to_string(), removed));
        self.events.broadcast(Event::progress_updated(user_id, None));
        Ok(ReplacedRoadmap { removed, modules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::EventType;
    use crate::storage::test_utils::create_test_storage;
    use crate::types::ModuleState;

    #[tokio::test]
    async fn test_plan_is_deterministic() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let generator = RoadmapGenerator::new(
            Arc::new(Catalog::bundled().unwrap()),
            storage,
            EventBroadcaster::default(),
        );
        let user = UserId::new();

        let titles = |modules: Vec<RoadmapModule>| -> Vec<(i64, String)> {
            modules.into_iter().map(|m| (m.order_index, m.title)).collect()
        };
        let first = titles(generator.plan(user, "FullStack", 1));
        let second = titles(generator.plan(user, "FullStack", 1));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_generate_inserts_beginner_steps() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let generator =
            RoadmapGenerator::new(catalog.clone(), storage.clone(), EventBroadcaster::default());
        let user = UserId::new();

        let generated = generator.generate(user, "AI", 0).await.unwrap();
        let expected: Vec<_> = catalog
            .steps("AI", DifficultyLevel::Beginner)
            .iter()
            .map(|s| s.title.clone())
            .collect();

        let stored = storage.list_modules(user, Some("AI")).await.unwrap();
        assert_eq!(stored.len(), generated.len());
        assert_eq!(stored.iter().map(|m| m.title.clone()).collect::<Vec<_>>(), expected);
        for (index, module) in stored.iter().enumerate() {
            assert_eq!(module.order_index, index as i64);
            assert_eq!(module.difficulty, 0);
            let expected_state = if index == 0 {
                ModuleState::Unlocked
            } else {
                ModuleState::Locked
            };
            assert_eq!(module.state(), expected_state);
        }
    }

    #[tokio::test]
    async fn test_unknown_topic_is_a_silent_no_op() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let events = EventBroadcaster::default();
        let user = UserId::new();
        let mut sub = events.subscribe(user);
        let generator =
            RoadmapGenerator::new(Arc::new(Catalog::bundled().unwrap()), storage.clone(), events);

        assert!(generator.generate(user, "Astrology", 0).await.unwrap().is_empty());
        assert!(storage.list_modules(user, None).await.unwrap().is_empty());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_every_topic_for_beginner_steps() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let events = EventBroadcaster::default();
        let user = UserId::new();
        let generator = RoadmapGenerator::new(catalog.clone(), storage.clone(), events.clone());
        let first = generator.generate(user, "AI", 2).await.unwrap();
        let second = generator.generate(user, "FullStack", 1).await.unwrap();

        let mut sub = events.subscribe(user);
        let replaced = generator.replace(user, " DataScience ").await.unwrap();
        assert_eq!(replaced.removed as usize, first.len() + second.len());

        let expected = catalog.steps("DataScience", DifficultyLevel::Beginner);
        let stored = storage.list_modules(user, None).await.unwrap();
        assert_eq!(stored.len(), expected.len());
        assert!(stored
            .iter()
            .all(|m| m.topic == "DataScience" && m.difficulty == REPLACEMENT_DIFFICULTY));
        assert_eq!(stored[0].state(), ModuleState::Unlocked);
        assert!(stored[1..].iter().all(|m| m.state() == ModuleState::Locked));

        let reset = sub.try_recv().unwrap();
        assert!(matches!(reset.event_type, EventType::RoadmapReset { .. }));
        let progress = sub.try_recv().unwrap();
        assert!(matches!(progress.event_type, EventType::ProgressUpdated { .. }));
    }

    #[tokio::test]
    async fn test_replace_with_unknown_topic_keeps_roadmap() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let generator = RoadmapGenerator::new(
            Arc::new(Catalog::bundled().unwrap()),
            storage.clone(),
            EventBroadcaster::default(),
        );
        let user = UserId::new();
        let generated = generator.generate(user, "AI", 0).await.unwrap();

        let err = generator.replace(user, "Astrology").await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));
        assert_eq!(storage.list_modules(user, None).await.unwrap().len(), generated.len());
    }
}
