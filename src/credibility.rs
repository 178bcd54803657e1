//! Credibility rule: 10 points per completed module, capped at 100

use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::UserId;
use std::sync::Arc;
use tracing::debug;

pub const POINTS_PER_COMPLETION: usize = 10;
pub const MAX_CREDIBILITY: u8 = 100;

/// Score for a completed-module count
pub fn credibility_for(completed: usize) -> u8 {
    completed
        .saturating_mul(POINTS_PER_COMPLETION)
        .min(MAX_CREDIBILITY as usize) as u8
}

pub struct CredibilityService {
    storage: Arc<dyn StorageBackend>,
}

impl CredibilityService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Recount completed modules across all topics and overwrite the score
    pub async fn recompute(&self, user_id: UserId) -> Result<u8> {
        let completed = self.storage.count_completed_modules(user_id).await?;
        let score = credibility_for(completed);
        self.storage.set_credibility(user_id, score).await?;
        debug!("Credibility of {} set to {} ({} completed)", user_id, score, completed);
        Ok(score)
    }
}
