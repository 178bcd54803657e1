//! Core data types for PathWise
//!
//! Rows of the store as used by client logic: profiles, roadmap modules,
//! activity logs, derived metrics, goals, community posts and mentorship.
//! Identifiers wrap UUIDs so ids of different tables cannot be mixed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an ID from a string
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

define_id!(
    /// Account and profile identifier (the profile id equals the account id)
    UserId
);
define_id!(
    /// Roadmap module identifier
    ModuleId
);
define_id!(
    /// Activity log entry identifier
    ActivityId
);
define_id!(
    /// User goal identifier
    GoalId
);
define_id!(
    /// Community question identifier
    QuestionId
);
define_id!(
    /// Community answer identifier
    AnswerId
);
define_id!(
    /// Mentor identifier
    MentorId
);
define_id!(
    /// Booked mentor session identifier
    MentorSessionId
);
define_id!(
    /// Mentor application identifier
    ApplicationId
);

/// Sign-in credentials of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    /// Lower-cased, unique
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Stored session; only the SHA-256 of the token is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token_hash: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Self-reported experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Intermediate,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Senior => "Senior",
        }
    }

    /// Numeric feature sent to the difficulty predictor
    pub fn feature(&self) -> i64 {
        match self {
            ExperienceLevel::Entry => 0,
            ExperienceLevel::Junior => 1,
            ExperienceLevel::Intermediate => 2,
            ExperienceLevel::Senior => 3,
        }
    }

    /// Lenient parse for stored labels: anything unrecognised is Senior
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(ExperienceLevel::Senior)
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Entry" => Ok(ExperienceLevel::Entry),
            "Junior" => Ok(ExperienceLevel::Junior),
            "Intermediate" => Ok(ExperienceLevel::Intermediate),
            "Senior" => Ok(ExperienceLevel::Senior),
            other => Err(format!(
                "Unknown experience level '{}' (expected Entry, Junior, Intermediate or Senior)",
                other
            )),
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    /// Chosen career topic; empty until a path is selected
    pub goal: String,
    pub experience_level: ExperienceLevel,
    pub skills: Vec<String>,
    /// 0-100, derived from completed modules
    pub credibility_score: u8,
    pub level: i64,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Profile as created at registration
    pub fn new(id: UserId, name: String, goal: String, experience_level: ExperienceLevel) -> Self {
        Self {
            id,
            name,
            goal,
            experience_level,
            skills: Vec::new(),
            credibility_score: 0,
            level: 1,
            language: "English".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn has_goal(&self) -> bool {
        !self.goal.trim().is_empty()
    }
}

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub goal: String,
    pub experience_level: ExperienceLevel,
    pub skills: Vec<String>,
}

/// Kind of roadmap step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Learning,
    Quiz,
    Project,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Learning => "learning",
            ModuleType::Quiz => "quiz",
            ModuleType::Project => "project",
        }
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learning" => Ok(ModuleType::Learning),
            "quiz" => Ok(ModuleType::Quiz),
            "project" => Ok(ModuleType::Project),
            other => Err(format!("Unknown module type: {}", other)),
        }
    }
}

/// A learning resource: either a plain label or a titled link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceLink {
    Plain(String),
    Linked { title: String, url: String },
}

impl ResourceLink {
    pub fn title(&self) -> &str {
        match self {
            ResourceLink::Plain(title) => title,
            ResourceLink::Linked { title, .. } => title,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ResourceLink::Plain(_) => None,
            ResourceLink::Linked { url, .. } => Some(url),
        }
    }
}

/// Resource bundle attached to a roadmap step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub articles: Vec<ResourceLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub courses: Vec<ResourceLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<ResourceLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ResourceLink>,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
            && self.courses.is_empty()
            && self.videos.is_empty()
            && self.projects.is_empty()
    }
}

/// Unlock state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Locked,
    Unlocked,
    Completed,
}

/// One ordered step of a user's roadmap for a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapModule {
    pub id: ModuleId,
    pub user_id: UserId,
    pub topic: String,
    pub order_index: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub resources: Resources,
    pub is_completed: bool,
    pub is_unlocked: bool,
    /// Difficulty (0/1/2) captured at generation time
    pub difficulty: i64,
    pub created_at: DateTime<Utc>,
}

impl RoadmapModule {
    pub fn state(&self) -> ModuleState {
        if self.is_completed {
            ModuleState::Completed
        } else if self.is_unlocked {
            ModuleState::Unlocked
        } else {
            ModuleState::Locked
        }
    }
}

/// Action tag of an activity log entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityAction {
    ModuleCompleted,
    MentorBooked,
    Other(String),
}

impl ActivityAction {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityAction::ModuleCompleted => "MODULE_COMPLETED",
            ActivityAction::MentorBooked => "MENTOR_BOOKED",
            ActivityAction::Other(tag) => tag,
        }
    }
}

impl From<String> for ActivityAction {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "MODULE_COMPLETED" => ActivityAction::ModuleCompleted,
            "MENTOR_BOOKED" => ActivityAction::MentorBooked,
            _ => ActivityAction::Other(tag),
        }
    }
}

impl From<ActivityAction> for String {
    fn from(action: ActivityAction) -> Self {
        action.as_str().to_string()
    }
}

/// Append-only activity event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: ActivityId,
    pub user_id: UserId,
    pub action: ActivityAction,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// New log entry timestamped now
    pub fn new(user_id: UserId, action: ActivityAction, metadata: serde_json::Value) -> Self {
        Self {
            id: ActivityId::new(),
            user_id,
            action,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Derived per-user scores, overwritten on every recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub user_id: UserId,
    pub engagement_score: i64,
    pub velocity_score: i64,
    pub mastery_score: i64,
    pub updated_at: DateTime<Utc>,
}

/// Goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "cancelled" => Ok(GoalStatus::Cancelled),
            other => Err(format!("Unknown goal status: {}", other)),
        }
    }
}

/// User-authored target with a deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub goal_title: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityQuestion {
    pub id: QuestionId,
    pub user_id: UserId,
    pub question: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityAnswer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mentor catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mentor {
    #[serde(default)]
    pub id: MentorId,
    pub name: String,
    pub role: String,
    pub company: String,
    pub rating: f64,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub min_credibility: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

/// A booked mentor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorSession {
    pub id: MentorSessionId,
    pub user_id: UserId,
    pub mentor_id: MentorId,
    pub session_date: DateTime<Utc>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

/// Submitted request to become a mentor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorApplication {
    pub id: ApplicationId,
    pub full_name: String,
    pub email: String,
    pub educational_qualification: String,
    pub stream_of_mentoring: String,
    pub certificate_url: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Completion counts over a set of modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    /// Rounded percentage, 0 when there are no modules
    pub percent: u8,
}

impl ProgressSummary {
    pub fn from_modules(modules: &[RoadmapModule]) -> Self {
        let total = modules.len();
        let completed = modules.iter().filter(|m| m.is_completed).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            completed,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(order_index: i64, completed: bool, unlocked: bool) -> RoadmapModule {
        RoadmapModule {
            id: ModuleId::new(),
            user_id: UserId::new(),
            topic: "AI".to_string(),
            order_index,
            title: format!("Step {}", order_index),
            description: String::new(),
            module_type: ModuleType::Learning,
            resources: Resources::default(),
            is_completed: completed,
            is_unlocked: unlocked,
            difficulty: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_experience_feature_mapping() {
        assert_eq!(ExperienceLevel::Entry.feature(), 0);
        assert_eq!(ExperienceLevel::Junior.feature(), 1);
        assert_eq!(ExperienceLevel::Intermediate.feature(), 2);
        assert_eq!(ExperienceLevel::Senior.feature(), 3);
        assert_eq!(ExperienceLevel::from_label("Principal"), ExperienceLevel::Senior);
        assert!("Principal".parse::<ExperienceLevel>().is_err());
    }

    #[test]
    fn test_resource_link_shapes() {
        let json = r#"{"articles": ["Intro post", {"title": "Docs", "url": "https://example.com"}]}"#;
        let resources: Resources = serde_json::from_str(json).unwrap();
        assert_eq!(resources.articles.len(), 2);
        assert_eq!(resources.articles[0].url(), None);
        assert_eq!(resources.articles[1].url(), Some("https://example.com"));
        assert!(resources.videos.is_empty());
    }

    #[test]
    fn test_activity_action_tags() {
        let action: ActivityAction = "MODULE_COMPLETED".to_string().into();
        assert_eq!(action, ActivityAction::ModuleCompleted);
        let other: ActivityAction = "PROFILE_VIEWED".to_string().into();
        assert_eq!(other.as_str(), "PROFILE_VIEWED");
        assert_eq!(
            serde_json::to_string(&ActivityAction::MentorBooked).unwrap(),
            "\"MENTOR_BOOKED\""
        );
    }

    #[test]
    fn test_module_state() {
        assert_eq!(module(0, false, false).state(), ModuleState::Locked);
        assert_eq!(module(0, false, true).state(), ModuleState::Unlocked);
        assert_eq!(module(0, true, true).state(), ModuleState::Completed);
    }

    #[test]
    fn test_progress_summary() {
        assert_eq!(ProgressSummary::from_modules(&[]).percent, 0);
        let modules = vec![module(0, true, true), module(1, false, true), module(2, false, false)];
        let summary = ProgressSummary::from_modules(&modules);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.percent, 33);
    }
}
