//! Test utilities for storage initialization
//!
//! libSQL keeps `:memory:` databases per connection, so tests use a fresh
//! file inside a temporary directory. Keep the returned `TempDir` alive for
//! the duration of the test.

use crate::error::Result;
use crate::storage::libsql::{ConnectionMode, LibsqlStorage};
use crate::types::{
    ExperienceLevel, ModuleId, ModuleType, Profile, Resources, RoadmapModule, UserId,
};
use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a migrated storage backend on a temporary file
pub async fn create_test_storage() -> Result<(Arc<LibsqlStorage>, TempDir)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("pathwise.db");
    let storage = LibsqlStorage::new_with_validation(
        ConnectionMode::Local(path.display().to_string()),
        true,
    )
    .await?;
    Ok((Arc::new(storage), dir))
}

pub fn sample_profile(name: &str, goal: &str) -> Profile {
    Profile::new(
        UserId::new(),
        name.to_string(),
        goal.to_string(),
        ExperienceLevel::Junior,
    )
}

/// `count` sequential modules for a topic with only the first unlocked
pub fn sample_modules(user_id: UserId, topic: &str, count: usize) -> Vec<RoadmapModule> {
    (0..count)
        .map(|index| RoadmapModule {
            id: ModuleId::new(),
            user_id,
            topic: topic.to_string(),
            order_index: index as i64,
            title: format!("{} step {}", topic, index + 1),
            description: format!("Step {} of the {} path", index + 1, topic),
            module_type: ModuleType::Learning,
            resources: Resources::default(),
            is_completed: false,
            is_unlocked: index == 0,
            difficulty: 0,
            created_at: Utc::now(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;

    #[tokio::test]
    async fn test_create_test_storage_is_migrated() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        assert!(storage.list_questions().await.unwrap().is_empty());
        assert!(storage.list_mentors().await.unwrap().is_empty());
    }
}
