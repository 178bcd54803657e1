//! Derived per-user metrics
//!
//! Engagement, velocity and mastery are recomputed wholesale from the
//! activity log and upserted; they are never incremented in place.

use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::{ActivityAction, ActivityLog, UserId, UserMetrics};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Window of activity counted toward engagement
pub const ENGAGEMENT_WINDOW_DAYS: i64 = 7;

pub fn engagement_score(recent_logs: usize) -> i64 {
    10 * recent_logs as i64
}

pub fn velocity_score(completions: usize) -> i64 {
    5 * completions as i64
}

pub fn mastery_score(completions: usize) -> i64 {
    (8 * completions as i64).min(100)
}

/// Compute metrics from a user's full activity log.
///
/// Returns `None` for an empty log so callers skip the write instead of
/// overwriting existing scores with zeros. Logs strictly newer than
/// `now - 7 days` count toward engagement; completions are all-time.
pub fn compute_metrics(
    user_id: UserId,
    logs: &[ActivityLog],
    now: DateTime<Utc>,
) -> Option<UserMetrics> {
    if logs.is_empty() {
        return None;
    }

    let cutoff = now - Duration::days(ENGAGEMENT_WINDOW_DAYS);
    let recent = logs.iter().filter(|log| log.created_at > cutoff).count();
    let completions = logs
        .iter()
        .filter(|log| log.action == ActivityAction::ModuleCompleted)
        .count();

    Some(UserMetrics {
        user_id,
        engagement_score: engagement_score(recent),
        velocity_score: velocity_score(completions),
        mastery_score: mastery_score(completions),
        updated_at: now,
    })
}

/// Recomputes and persists metrics
pub struct MetricsEngine {
    storage: Arc<dyn StorageBackend>,
}

impl MetricsEngine {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Recompute from the activity log and upsert; no-op without logs
    pub async fn recalculate(&self, user_id: UserId) -> Result<Option<UserMetrics>> {
        let logs = self.storage.list_activity(user_id, None).await?;
        match compute_metrics(user_id, &logs, Utc::now()) {
            Some(metrics) => {
                self.storage.upsert_metrics(&metrics).await?;
                debug!(
                    "Metrics for {}: engagement={} velocity={} mastery={}",
                    user_id, metrics.engagement_score, metrics.velocity_score, metrics.mastery_score
                );
                Ok(Some(metrics))
            }
            None => {
                debug!("No activity for {}, metrics left untouched", user_id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::create_test_storage;
    use proptest::prelude::*;

    fn log_at(user_id: UserId, action: ActivityAction, created_at: DateTime<Utc>) -> ActivityLog {
        ActivityLog {
            created_at,
            ..ActivityLog::new(user_id, action, serde_json::json!({}))
        }
    }

    proptest! {
        #[test]
        fn prop_completion_scores(c in 0usize..10_000) {
            prop_assert_eq!(velocity_score(c), 5 * c as i64);
            prop_assert_eq!(mastery_score(c), std::cmp::min(100, 8 * c as i64));
            prop_assert!(mastery_score(c) <= 100);
        }

        #[test]
        fn prop_engagement_is_ten_per_recent_log(w in 0usize..10_000) {
            prop_assert_eq!(engagement_score(w), 10 * w as i64);
        }
    }

    #[test]
    fn test_reference_points() {
        assert_eq!((mastery_score(0), velocity_score(0)), (0, 0));
        assert_eq!((mastery_score(12), velocity_score(12)), (96, 60));
        assert_eq!((mastery_score(20), velocity_score(20)), (100, 100));
    }

    #[test]
    fn test_compute_metrics_windows() {
        let user = UserId::new();
        let now = Utc::now();
        let logs = vec![
            log_at(user, ActivityAction::ModuleCompleted, now - Duration::hours(1)),
            log_at(user, ActivityAction::MentorBooked, now - Duration::days(2)),
            log_at(user, ActivityAction::ModuleCompleted, now - Duration::days(30)),
            // Exactly on the cutoff is outside the window
            log_at(user, ActivityAction::Other("PROFILE_EDITED".into()), now - Duration::days(7)),
        ];

        let metrics = compute_metrics(user, &logs, now).unwrap();
        assert_eq!(metrics.engagement_score, 20);
        assert_eq!(metrics.velocity_score, 10);
        assert_eq!(metrics.mastery_score, 16);
        assert_eq!(metrics.updated_at, now);
    }

    #[test]
    fn test_compute_metrics_empty_log_is_none() {
        assert!(compute_metrics(UserId::new(), &[], Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_recalculate_without_logs_writes_nothing() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let engine = MetricsEngine::new(storage.clone());
        let user = UserId::new();

        assert!(engine.recalculate(user).await.unwrap().is_none());
        assert!(storage.get_metrics(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recalculate_upserts_from_logs() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let engine = MetricsEngine::new(storage.clone());
        let user = UserId::new();
        storage
            .insert_activity(&ActivityLog::new(
                user,
                ActivityAction::ModuleCompleted,
                serde_json::json!({"title": "Intro"}),
            ))
            .await
            .unwrap();

        engine.recalculate(user).await.unwrap();
        let stored = storage.get_metrics(user).await.unwrap().unwrap();
        assert_eq!(stored.engagement_score, 10);
        assert_eq!(stored.velocity_score, 5);
        assert_eq!(stored.mastery_score, 8);
    }
}
