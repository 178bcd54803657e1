//! User goals with deadlines

use crate::error::{PathwiseError, Result};
use crate::storage::StorageBackend;
use crate::types::{Goal, GoalId, GoalStatus, UserId};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Fields of a new or edited goal
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalInput {
    pub goal_title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deadline: NaiveDate,
}

impl GoalInput {
    fn validated(self) -> Result<(String, Option<String>, NaiveDate)> {
        let title = self.goal_title.trim();
        if title.is_empty() {
            return Err(PathwiseError::validation("Goal title is required"));
        }
        Ok((title.to_string(), blank_to_none(self.description), self.deadline))
    }
}

/// Trimmed text, `None` when missing or blank
pub(crate) fn blank_to_none(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

pub struct GoalService {
    storage: Arc<dyn StorageBackend>,
}

impl GoalService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Load a goal the caller owns
    async fn owned(&self, user_id: UserId, id: GoalId) -> Result<Goal> {
        let goal = self
            .storage
            .get_goal(id)
            .await?
            .ok_or_else(|| PathwiseError::NotFound(format!("goal {}", id)))?;
        if goal.user_id != user_id {
            return Err(PathwiseError::Forbidden(format!(
                "goal {} belongs to another user",
                id
            )));
        }
        Ok(goal)
    }

    pub async fn create(&self, user_id: UserId, input: GoalInput) -> Result<Goal> {
        let (goal_title, description, deadline) = input.validated()?;
        let now = Utc::now();
        let goal = Goal {
            id: GoalId::new(),
            user_id,
            goal_title,
            description,
            deadline,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_goal(&goal).await?;
        info!("{} created goal '{}'", user_id, goal.goal_title);
        Ok(goal)
    }

    pub async fn update(&self, user_id: UserId, id: GoalId, input: GoalInput) -> Result<Goal> {
        let mut goal = self.owned(user_id, id).await?;
        let (goal_title, description, deadline) = input.validated()?;
        goal.goal_title = goal_title;
        goal.description = description;
        goal.deadline = deadline;
        goal.updated_at = Utc::now();
        self.storage.update_goal(&goal).await?;
        Ok(goal)
    }

    pub async fn set_status(
        &self,
        user_id: UserId,
        id: GoalId,
        status: GoalStatus,
    ) -> Result<Goal> {
        let mut goal = self.owned(user_id, id).await?;
        goal.status = status;
        goal.updated_at = Utc::now();
        self.storage.update_goal(&goal).await?;
        info!("Goal {} is now {}", id, status.as_str());
        Ok(goal)
    }

    pub async fn delete(&self, user_id: UserId, id: GoalId) -> Result<()> {
        self.owned(user_id, id).await?;
        self.storage.delete_goal(id).await
    }

    /// Goals of the user, newest first
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Goal>> {
        self.storage.list_goals(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::create_test_storage;

    fn input(title: &str, description: Option<&str>) -> GoalInput {
        GoalInput {
            goal_title: title.to_string(),
            description: description.map(str::to_string),
            deadline: NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("   ".into())), None);
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some(" notes ".into())), Some("notes".into()));
    }

    #[tokio::test]
    async fn test_create_requires_title_and_blanks_description() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let goals = GoalService::new(storage);
        let user = UserId::new();

        let err = goals.create(user, input("  ", None)).await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));

        let goal = goals.create(user, input("Ship a portfolio", Some(" "))).await.unwrap();
        assert_eq!(goal.description, None);
        assert_eq!(goal.status, GoalStatus::Active);
        let listed = goals.list(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, goal.id);
        assert_eq!(listed[0].description, None);
    }

    #[tokio::test]
    async fn test_only_owner_may_change_a_goal() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let goals = GoalService::new(storage);
        let owner = UserId::new();
        let stranger = UserId::new();
        let goal = goals.create(owner, input("Learn Rust", None)).await.unwrap();

        let err = goals
            .update(stranger, goal.id, input("Mine now", None))
            .await
            .unwrap_err();
        assert!(matches!(err, PathwiseError::Forbidden(_)));
        let err = goals
            .set_status(stranger, goal.id, GoalStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, PathwiseError::Forbidden(_)));
        let err = goals.delete(stranger, goal.id).await.unwrap_err();
        assert!(matches!(err, PathwiseError::Forbidden(_)));

        let done = goals
            .set_status(owner, goal.id, GoalStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, GoalStatus::Completed);
        assert!(done.updated_at >= goal.updated_at);

        goals.delete(owner, goal.id).await.unwrap();
        assert!(goals.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_goal_is_not_found() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let goals = GoalService::new(storage);
        let err = goals
            .update(UserId::new(), GoalId::new(), input("x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, PathwiseError::NotFound(_)));
    }
}
