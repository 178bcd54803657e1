//! Registration and profile editing

use crate::auth::AuthService;
use crate::error::{PathwiseError, Result};
use crate::storage::StorageBackend;
use crate::types::{ExperienceLevel, Profile, ProfileUpdate, UserId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Sign-up form
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Catalog topic; may be empty to choose later
    #[serde(default)]
    pub goal: String,
    pub experience_level: ExperienceLevel,
}

/// Profile edit form; skills as typed, comma separated
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEdit {
    pub name: String,
    #[serde(default)]
    pub goal: String,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub skills: String,
}

/// Split a comma separated list, trimming and dropping blanks
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct ProfileService {
    auth: Arc<AuthService>,
    storage: Arc<dyn StorageBackend>,
}

impl ProfileService {
    pub fn new(auth: Arc<AuthService>, storage: Arc<dyn StorageBackend>) -> Self {
        Self { auth, storage }
    }

    /// Create the account, then its profile with default scores
    pub async fn register(&self, registration: Registration) -> Result<Profile> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(PathwiseError::validation("Name is required"));
        }
        let account = self
            .auth
            .sign_up(&registration.email, &registration.password)
            .await?;
        let profile = Profile::new(
            account.id,
            name.to_string(),
            registration.goal.trim().to_string(),
            registration.experience_level,
        );
        self.storage.create_profile(&profile).await?;
        info!("Created profile for {}", account.id);
        Ok(profile)
    }

    pub async fn get(&self, user_id: UserId) -> Result<Profile> {
        self.storage
            .get_profile(user_id)
            .await?
            .ok_or_else(|| PathwiseError::ProfileNotFound(user_id.to_string()))
    }

    pub async fn update(&self, user_id: UserId, edit: ProfileEdit) -> Result<Profile> {
        let name = edit.name.trim();
        if name.is_empty() {
            return Err(PathwiseError::validation("Name is required"));
        }
        let update = ProfileUpdate {
            name: name.to_string(),
            goal: edit.goal.trim().to_string(),
            experience_level: edit.experience_level,
            skills: parse_skills(&edit.skills),
        };
        self.storage.update_profile(user_id, &update).await
    }
}
