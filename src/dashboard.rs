//! Dashboard load workflow
//!
//! Reconciles derived values, loads the roadmap of the chosen career path
//! and, on first visit, generates it at the predicted difficulty.

use crate::error::{PathwiseError, Result};
use crate::roadmap::{ProgressionService, RoadmapGenerator};
use crate::services::{predict_with_fallback, DifficultyPredictor, PredictionInput};
use crate::storage::StorageBackend;
use crate::types::{ActivityLog, Profile, ProgressSummary, RoadmapModule, UserId, UserMetrics};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Entries shown in the recent activity panel
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Estimated study hours per completed module
pub const HOURS_PER_MODULE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub completed: usize,
    pub percent: u8,
    pub study_hours: f64,
}

impl DashboardSummary {
    pub fn from_modules(modules: &[RoadmapModule]) -> Self {
        let progress = ProgressSummary::from_modules(modules);
        Self {
            total: progress.total,
            completed: progress.completed,
            percent: progress.percent,
            study_hours: progress.completed as f64 * HOURS_PER_MODULE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub profile: Profile,
    pub modules: Vec<RoadmapModule>,
    pub metrics: Option<UserMetrics>,
    pub recent_activity: Vec<ActivityLog>,
    pub summary: DashboardSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "dashboard", rename_all = "snake_case")]
pub enum DashboardOutcome {
    /// No goal chosen yet; the user must pick a career path first
    SelectCareerPath,
    Ready(Box<DashboardView>),
}

pub struct DashboardService {
    storage: Arc<dyn StorageBackend>,
    progression: Arc<ProgressionService>,
    generator: Arc<RoadmapGenerator>,
    predictor: Arc<dyn DifficultyPredictor>,
    fallback_difficulty: Option<i64>,
}

impl DashboardService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        progression: Arc<ProgressionService>,
        generator: Arc<RoadmapGenerator>,
        predictor: Arc<dyn DifficultyPredictor>,
        fallback_difficulty: Option<i64>,
    ) -> Self {
        Self {
            storage,
            progression,
            generator,
            predictor,
            fallback_difficulty,
        }
    }

    async fn profile(&self, user_id: UserId) -> Result<Profile> {
        self.storage
            .get_profile(user_id)
            .await?
            .ok_or_else(|| PathwiseError::ProfileNotFound(user_id.to_string()))
    }

    pub async fn load(&self, user_id: UserId) -> Result<DashboardOutcome> {
        let profile = self.profile(user_id).await?;
        if !profile.has_goal() {
            debug!("{} has no career path yet", user_id);
            return Ok(DashboardOutcome::SelectCareerPath);
        }

        self.progression.reconcile(user_id).await?;
        // Credibility may have moved during reconcile
        let profile = self.profile(user_id).await?;
        let metrics = self.storage.get_metrics(user_id).await?;

        let mut modules = self.storage.list_modules(user_id, Some(&profile.goal)).await?;
        if modules.is_empty() {
            let all = self.storage.list_modules(user_id, None).await?;
            if let Some(first_topic) = all.first().map(|m| m.topic.clone()) {
                debug!(
                    "No roadmap for goal '{}', showing '{}' instead",
                    profile.goal, first_topic
                );
                modules = all.into_iter().filter(|m| m.topic == first_topic).collect();
            }
        }

        if modules.is_empty() {
            let input = PredictionInput::from_profile(&profile, metrics.as_ref());
            let difficulty =
                predict_with_fallback(self.predictor.as_ref(), &input, self.fallback_difficulty)
                    .await?;
            info!(
                "Generating '{}' roadmap for {} at difficulty {}",
                profile.goal, user_id, difficulty
            );
            self.generator
                .generate(user_id, &profile.goal, difficulty)
                .await?;
            modules = self.storage.list_modules(user_id, Some(&profile.goal)).await?;
        }

        let recent_activity = self
            .storage
            .list_activity(user_id, Some(RECENT_ACTIVITY_LIMIT))
            .await?;
        let summary = DashboardSummary::from_modules(&modules);

        Ok(DashboardOutcome::Ready(Box::new(DashboardView {
            profile,
            modules,
            metrics,
            recent_activity,
            summary,
        })))
    }

    /// All of the user's modules, optionally one topic
    pub async fn roadmap(
        &self,
        user_id: UserId,
        topic: Option<&str>,
    ) -> Result<Vec<RoadmapModule>> {
        self.storage.list_modules(user_id, topic).await
    }

    /// Completion counts across every topic of the user
    pub async fn progress(&self, user_id: UserId) -> Result<ProgressSummary> {
        let modules = self.storage.list_modules(user_id, None).await?;
        Ok(ProgressSummary::from_modules(&modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::EventBroadcaster;
    use crate::roadmap::{Catalog, DifficultyLevel};
    use crate::services::predictor::MockDifficultyPredictor;
    use crate::storage::libsql::LibsqlStorage;
    use crate::storage::test_utils::{create_test_storage, sample_modules, sample_profile};

    fn service(
        storage: Arc<LibsqlStorage>,
        predictor: MockDifficultyPredictor,
        fallback: Option<i64>,
    ) -> DashboardService {
        let events = EventBroadcaster::default();
        let catalog = Arc::new(Catalog::bundled().unwrap());
        DashboardService::new(
            storage.clone(),
            Arc::new(ProgressionService::new(storage.clone(), events.clone())),
            Arc::new(RoadmapGenerator::new(catalog, storage.clone(), events)),
            Arc::new(predictor),
            fallback,
        )
    }

    #[test]
    fn test_summary_study_hours() {
        let user = UserId::new();
        let mut modules = sample_modules(user, "AI", 4);
        modules[0].is_completed = true;
        modules[1].is_completed = true;
        let summary = DashboardSummary::from_modules(&modules);
        assert_eq!(summary.percent, 50);
        assert_eq!(summary.study_hours, 3.0);
    }

    #[tokio::test]
    async fn test_empty_goal_asks_for_career_path() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "");
        storage.create_profile(&profile).await.unwrap();

        let mut predictor = MockDifficultyPredictor::new();
        predictor.expect_predict().never();
        let outcome = service(storage, predictor, Some(0)).load(profile.id).await.unwrap();
        assert_eq!(outcome, DashboardOutcome::SelectCareerPath);
    }

    #[tokio::test]
    async fn test_missing_profile_is_an_error() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let err = service(storage, MockDifficultyPredictor::new(), Some(0))
            .load(UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PathwiseError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_first_load_generates_at_predicted_difficulty() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "DataScience");
        storage.create_profile(&profile).await.unwrap();

        let mut predictor = MockDifficultyPredictor::new();
        predictor
            .expect_predict()
            .times(1)
            .returning(|input| {
                assert_eq!(input.experience, 1);
                assert_eq!(input.credibility, 0);
                Ok(1)
            });

        let dashboard = service(storage.clone(), predictor, Some(0));
        let DashboardOutcome::Ready(view) = dashboard.load(profile.id).await.unwrap() else {
            panic!("expected a dashboard");
        };

        let expected = Catalog::bundled()
            .unwrap()
            .steps("DataScience", DifficultyLevel::Intermediate)
            .len();
        assert_eq!(view.modules.len(), expected);
        assert!(view.modules.iter().all(|m| m.difficulty == 1));
        assert_eq!(view.summary.completed, 0);
        assert!(view.recent_activity.is_empty());

        // Second load reuses the stored roadmap without predicting again
        let DashboardOutcome::Ready(again) = dashboard.load(profile.id).await.unwrap() else {
            panic!("expected a dashboard");
        };
        assert_eq!(again.modules.len(), expected);
        assert_eq!(storage.list_modules(profile.id, None).await.unwrap().len(), expected);
    }

    #[tokio::test]
    async fn test_predictor_failure_uses_fallback() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "AI");
        storage.create_profile(&profile).await.unwrap();

        let mut predictor = MockDifficultyPredictor::new();
        predictor
            .expect_predict()
            .returning(|_| Err(PathwiseError::Predictor("connection refused".into())));

        let DashboardOutcome::Ready(view) =
            service(storage, predictor, Some(0)).load(profile.id).await.unwrap()
        else {
            panic!("expected a dashboard");
        };
        assert!(!view.modules.is_empty());
        assert!(view.modules.iter().all(|m| m.difficulty == 0));
    }

    #[tokio::test]
    async fn test_predictor_failure_without_fallback_propagates() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "AI");
        storage.create_profile(&profile).await.unwrap();

        let mut predictor = MockDifficultyPredictor::new();
        predictor
            .expect_predict()
            .returning(|_| Err(PathwiseError::Predictor("timeout".into())));

        let err = service(storage.clone(), predictor, None)
            .load(profile.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PathwiseError::Predictor(_)));
        assert!(storage.list_modules(profile.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_first_existing_topic() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let profile = sample_profile("Ada", "AI");
        storage.create_profile(&profile).await.unwrap();
        storage
            .insert_modules(&sample_modules(profile.id, "FullStack", 3))
            .await
            .unwrap();

        let mut predictor = MockDifficultyPredictor::new();
        predictor.expect_predict().never();
        let DashboardOutcome::Ready(view) =
            service(storage, predictor, Some(0)).load(profile.id).await.unwrap()
        else {
            panic!("expected a dashboard");
        };
        assert_eq!(view.modules.len(), 3);
        assert!(view.modules.iter().all(|m| m.topic == "FullStack"));
    }
}
