//! Mentor catalog, session booking and mentor applications

use crate::api::events::{Event, EventBroadcaster};
use crate::auth::is_valid_email;
use crate::error::{PathwiseError, Result};
use crate::goals::blank_to_none;
use crate::roadmap::Catalog;
use crate::storage::StorageBackend;
use crate::types::{
    ActivityAction, ActivityLog, ApplicationId, ApplicationStatus, Mentor, MentorApplication,
    MentorId, MentorSession, MentorSessionId, SessionStatus, UserId,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Submitted mentor application form
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationInput {
    pub full_name: String,
    pub email: String,
    pub educational_qualification: String,
    /// Catalog topic the applicant wants to mentor in
    pub stream_of_mentoring: String,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

pub struct MentorshipService {
    catalog: Arc<Catalog>,
    storage: Arc<dyn StorageBackend>,
    events: EventBroadcaster,
}

impl MentorshipService {
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

    /// Mentors by rating, highest first
    pub async fn list_mentors(&self) -> Result<Vec<Mentor>> {
        self.storage.list_mentors().await
    }

    /// Book a `scheduled` session, at `session_date` or now.
    ///
    /// The session and its `MENTOR_BOOKED` activity commit together.
    pub async fn book(
        &self,
        user_id: UserId,
        mentor_id: MentorId,
        session_date: Option<DateTime<Utc>>,
    ) -> Result<MentorSession> {
        let mentor = self
            .storage
            .get_mentor(mentor_id)
            .await?
            .ok_or_else(|| PathwiseError::MentorNotFound(mentor_id.to_string()))?;

        let now = Utc::now();
        let session = MentorSession {
            id: MentorSessionId::new(),
            user_id,
            mentor_id,
            session_date: session_date.unwrap_or(now),
            status: SessionStatus::Scheduled,
            created_at: now,
        };
        let log = ActivityLog::new(
            user_id,
            ActivityAction::MentorBooked,
            serde_json::json!({ "mentor_id": mentor_id }),
        );
        self.storage.book_session(&session, &log).await?;
        info!("{} booked {} for {}", user_id, mentor.name, session.session_date);

        self.events
            .broadcast(Event::mentor_booked(user_id, mentor_id, session.id));
        Ok(session)
    }

    /// Sessions of the user, latest first
    pub async fn sessions(&self, user_id: UserId) -> Result<Vec<MentorSession>> {
        self.storage.list_sessions(user_id).await
    }

    /// Upsert every mentor of a JSON array document; returns the count.
    ///
    /// The whole document is checked before the first write.
    pub async fn import_mentors(&self, json: &str) -> Result<usize> {
        let mentors: Vec<Mentor> = serde_json::from_str(json)?;
        if let Some(index) = mentors.iter().position(|m| m.name.trim().is_empty()) {
            return Err(PathwiseError::validation(format!(
                "Mentor name is required (entry {})",
                index + 1
            )));
        }
        for mentor in &mentors {
            self.storage.upsert_mentor(mentor).await?;
        }
        info!("Imported {} mentors", mentors.len());
        Ok(mentors.len())
    }

    pub async fn import_mentors_from_path(&self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        self.import_mentors(&json).await
    }

    /// Store a `pending` application after checking the form
    pub async fn apply(&self, input: ApplicationInput) -> Result<MentorApplication> {
        let full_name = input.full_name.trim();
        let email = input.email.trim();
        let qualification = input.educational_qualification.trim();
        let stream = input.stream_of_mentoring.trim();

        if full_name.is_empty()
            || email.is_empty()
            || qualification.is_empty()
            || stream.is_empty()
        {
            return Err(PathwiseError::validation("Please fill in all required fields"));
        }
        if !is_valid_email(email) {
            return Err(PathwiseError::validation("Please enter a valid email address"));
        }
        if !self.catalog.contains_topic(stream) {
            return Err(PathwiseError::validation(format!(
                "Unknown mentoring stream '{}'",
                stream
            )));
        }

        let application = MentorApplication {
            id: ApplicationId::new(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            educational_qualification: qualification.to_string(),
            stream_of_mentoring: stream.to_string(),
            certificate_url: blank_to_none(input.certificate_url),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        self.storage.create_application(&application).await?;
        info!("Mentor application {} received for {}", application.id, stream);
        Ok(application)
    }
}
