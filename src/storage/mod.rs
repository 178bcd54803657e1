//! Storage layer for PathWise
//!
//! Provides the backend trait over the relational store (accounts, profiles,
//! roadmaps, activity, metrics, goals, community and mentorship tables) and
//! the libSQL implementation.

pub mod libsql;
#[cfg(test)]
pub mod test_utils;

use crate::error::Result;
use crate::types::{
    Account, ActivityLog, AnswerId, AuthSession, CommunityAnswer, CommunityQuestion, Goal, GoalId,
    Mentor, MentorApplication, MentorId, MentorSession, ModuleId, Profile, ProfileUpdate,
    QuestionId, RoadmapModule, UserId, UserMetrics,
};
use async_trait::async_trait;

/// Result of the transactional completion core
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Module marked completed, successor (if any) unlocked, activity logged
    Applied {
        module: RoadmapModule,
        unlocked: Option<RoadmapModule>,
    },
    /// Module is still locked; nothing written
    Locked,
    /// Module was already completed; nothing written
    AlreadyCompleted,
    /// No such module for this user
    NotFound,
}

/// Storage backend trait defining all required operations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // Accounts and sessions

    /// Insert a new account; duplicate emails fail with a constraint error
    async fn create_account(&self, account: &Account) -> Result<()>;

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn create_auth_session(&self, session: &AuthSession) -> Result<()>;

    async fn get_auth_session(&self, token_hash: &str) -> Result<Option<AuthSession>>;

    async fn delete_auth_session(&self, token_hash: &str) -> Result<()>;

    // Profiles

    async fn create_profile(&self, profile: &Profile) -> Result<()>;

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>>;

    /// Apply editable fields, returning the updated profile
    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile>;

    /// Overwrite the credibility score
    async fn set_credibility(&self, user_id: UserId, score: u8) -> Result<()>;

    // Roadmaps

    /// Insert all modules in one transaction
    async fn insert_modules(&self, modules: &[RoadmapModule]) -> Result<()>;

    /// Delete every roadmap row of the user and insert `modules` in one
    /// transaction; returns the number of deleted modules
    async fn replace_roadmap(&self, user_id: UserId, modules: &[RoadmapModule]) -> Result<u64>;

    /// Modules of a user ordered by order_index, optionally for one topic
    async fn list_modules(&self, user_id: UserId, topic: Option<&str>)
        -> Result<Vec<RoadmapModule>>;

    async fn get_module(&self, user_id: UserId, module_id: ModuleId)
        -> Result<Option<RoadmapModule>>;

    /// Mark completed, unlock the successor and append the
    /// `MODULE_COMPLETED` activity in one transaction
    async fn complete_module(&self, user_id: UserId, module_id: ModuleId)
        -> Result<CompletionOutcome>;

    /// Completed modules across all topics
    async fn count_completed_modules(&self, user_id: UserId) -> Result<usize>;

    /// Set the profile goal and delete every roadmap row of the user in one
    /// transaction; returns the number of deleted modules
    async fn reset_career_path(&self, user_id: UserId, topic: &str) -> Result<u64>;

    // Activity and metrics

    async fn insert_activity(&self, log: &ActivityLog) -> Result<()>;

    /// Activity of a user, newest first
    async fn list_activity(&self, user_id: UserId, limit: Option<usize>)
        -> Result<Vec<ActivityLog>>;

    /// Insert or overwrite the metrics row keyed by user
    async fn upsert_metrics(&self, metrics: &UserMetrics) -> Result<()>;

    async fn get_metrics(&self, user_id: UserId) -> Result<Option<UserMetrics>>;

    // Goals

    async fn create_goal(&self, goal: &Goal) -> Result<()>;

    async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    async fn update_goal(&self, goal: &Goal) -> Result<()>;

    async fn delete_goal(&self, id: GoalId) -> Result<()>;

    /// Goals of a user, newest first
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>>;

    // Community

    async fn create_question(&self, question: &CommunityQuestion) -> Result<()>;

    async fn get_question(&self, id: QuestionId) -> Result<Option<CommunityQuestion>>;

    async fn update_question(&self, question: &CommunityQuestion) -> Result<()>;

    /// Delete a question together with its answers
    async fn delete_question(&self, id: QuestionId) -> Result<()>;

    /// All questions, newest first
    async fn list_questions(&self) -> Result<Vec<CommunityQuestion>>;

    async fn create_answer(&self, answer: &CommunityAnswer) -> Result<()>;

    async fn get_answer(&self, id: AnswerId) -> Result<Option<CommunityAnswer>>;

    async fn update_answer(&self, answer: &CommunityAnswer) -> Result<()>;

    async fn delete_answer(&self, id: AnswerId) -> Result<()>;

    /// Answers of a question, oldest first
    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<CommunityAnswer>>;

    // Mentorship

    /// Insert or replace a mentor by id
    async fn upsert_mentor(&self, mentor: &Mentor) -> Result<()>;

    async fn get_mentor(&self, id: MentorId) -> Result<Option<Mentor>>;

    /// Mentors by rating, highest first
    async fn list_mentors(&self) -> Result<Vec<Mentor>>;

    /// Insert the session and its activity entry in one transaction
    async fn book_session(&self, session: &MentorSession, log: &ActivityLog) -> Result<()>;

    /// Sessions of a user, latest session date first
    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<MentorSession>>;

    async fn create_application(&self, application: &MentorApplication) -> Result<()>;
}
