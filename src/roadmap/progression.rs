//! Module completion and unlock state machine
//!
//! `locked -> unlocked -> completed`. The state change, successor unlock and
//! activity entry commit together in the store; metrics and credibility are
//! then recomputed from current data, so [`ProgressionService::reconcile`]
//! repairs any derived value left stale by an interrupted completion.

use crate::api::events::{Event, EventBroadcaster};
use crate::credibility::CredibilityService;
use crate::error::{PathwiseError, Result};
use crate::metrics::MetricsEngine;
use crate::storage::{CompletionOutcome, StorageBackend};
use crate::types::{ModuleId, RoadmapModule, UserId, UserMetrics};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Why a completion request changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Locked,
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionResult {
    Completed {
        module: RoadmapModule,
        unlocked: Option<RoadmapModule>,
        credibility: u8,
        metrics: Option<UserMetrics>,
    },
    Skipped { reason: SkipReason },
}

/// Derived values after a reconcile pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub metrics: Option<UserMetrics>,
    pub credibility: u8,
}

pub struct ProgressionService {
    storage: Arc<dyn StorageBackend>,
    metrics: MetricsEngine,
    credibility: CredibilityService,
    events: EventBroadcaster,
}

impl ProgressionService {
    pub fn new(storage: Arc<dyn StorageBackend>, events: EventBroadcaster) -> Self {
        Self {
            metrics: MetricsEngine::new(storage.clone()),
            credibility: CredibilityService::new(storage.clone()),
            storage,
            events,
        }
    }

    /// Complete an unlocked module of the user.
    ///
    /// Locked and already-completed modules are skipped without writes. An
    /// unknown module, or one owned by someone else, is `ModuleNotFound`.
    pub async fn complete_module(
        &self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> Result<CompletionResult> {
        let (module, unlocked) = match self.storage.complete_module(user_id, module_id).await? {
            CompletionOutcome::Applied { module, unlocked } => (module, unlocked),
            CompletionOutcome::Locked => {
                debug!("Module {} is locked, completion skipped", module_id);
                return Ok(CompletionResult::Skipped {
                    reason: SkipReason::Locked,
                });
            }
            CompletionOutcome::AlreadyCompleted => {
                debug!("Module {} already completed, completion skipped", module_id);
                return Ok(CompletionResult::Skipped {
                    reason: SkipReason::AlreadyCompleted,
                });
            }
            CompletionOutcome::NotFound => {
                return Err(PathwiseError::ModuleNotFound(module_id.to_string()));
            }
        };

        info!(
            "{} completed '{}' ({} #{})",
            user_id, module.title, module.topic, module.order_index
        );
        if let Some(next) = &unlocked {
            debug!("Unlocked '{}' ({} #{})", next.title, next.topic, next.order_index);
        }

        let reconciled = self.reconcile(user_id).await?;

        self.events
            .broadcast(Event::progress_updated(user_id, Some(module.id)));
        self.events
            .broadcast(Event::credibility_updated(user_id, reconciled.credibility));

        Ok(CompletionResult::Completed {
            module,
            unlocked,
            credibility: reconciled.credibility,
            metrics: reconciled.metrics,
        })
    }

    /// Recompute metrics and credibility from the stored log and roadmap
    pub async fn reconcile(&self, user_id: UserId) -> Result<Reconciled> {
        let metrics = self.metrics.recalculate(user_id).await?;
        let credibility = self.credibility.recompute(user_id).await?;
        Ok(Reconciled {
            metrics,
            credibility,
        })
    }
}
