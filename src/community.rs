//! Community questions and answers
//!
//! Anyone signed in may ask or answer; only the author may edit or delete
//! their own post. Threads carry display names resolved from profiles.

use crate::error::{PathwiseError, Result};
use crate::goals::blank_to_none;
use crate::storage::StorageBackend;
use crate::types::{AnswerId, CommunityAnswer, CommunityQuestion, QuestionId, UserId};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Display name used when the author has no profile
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerView {
    #[serde(flatten)]
    pub answer: CommunityAnswer,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionThread {
    #[serde(flatten)]
    pub question: CommunityQuestion,
    pub author_name: String,
    pub answers: Vec<AnswerView>,
}

pub struct CommunityService {
    storage: Arc<dyn StorageBackend>,
}

impl CommunityService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn required(text: &str, what: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PathwiseError::validation(format!("{} is required", what)));
        }
        Ok(text.to_string())
    }

    async fn authored_question(
        &self,
        user_id: UserId,
        id: QuestionId,
    ) -> Result<CommunityQuestion> {
        let question = self
            .storage
            .get_question(id)
            .await?
            .ok_or_else(|| PathwiseError::NotFound(format!("question {}", id)))?;
        if question.user_id != user_id {
            return Err(PathwiseError::Forbidden(format!(
                "question {} was asked by another user",
                id
            )));
        }
        Ok(question)
    }

    async fn authored_answer(&self, user_id: UserId, id: AnswerId) -> Result<CommunityAnswer> {
        let answer = self
            .storage
            .get_answer(id)
            .await?
            .ok_or_else(|| PathwiseError::NotFound(format!("answer {}", id)))?;
        if answer.user_id != user_id {
            return Err(PathwiseError::Forbidden(format!(
                "answer {} was written by another user",
                id
            )));
        }
        Ok(answer)
    }

    pub async fn ask(
        &self,
        user_id: UserId,
        question: &str,
        description: Option<String>,
    ) -> Result<CommunityQuestion> {
        let now = Utc::now();
        let question = CommunityQuestion {
            id: QuestionId::new(),
            user_id,
            question: Self::required(question, "Question")?,
            description: blank_to_none(description),
            created_at: now,
            updated_at: now,
        };
        self.storage.create_question(&question).await?;
        info!("{} asked question {}", user_id, question.id);
        Ok(question)
    }

    pub async fn edit_question(
        &self,
        user_id: UserId,
        id: QuestionId,
        question: &str,
        description: Option<String>,
    ) -> Result<CommunityQuestion> {
        let mut existing = self.authored_question(user_id, id).await?;
        existing.question = Self::required(question, "Question")?;
        existing.description = blank_to_none(description);
        existing.updated_at = Utc::now();
        self.storage.update_question(&existing).await?;
        Ok(existing)
    }

    /// Delete a question and all of its answers
    pub async fn delete_question(&self, user_id: UserId, id: QuestionId) -> Result<()> {
        self.authored_question(user_id, id).await?;
        self.storage.delete_question(id).await?;
        info!("{} deleted question {}", user_id, id);
        Ok(())
    }

    pub async fn answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        text: &str,
    ) -> Result<CommunityAnswer> {
        let answer = Self::required(text, "Answer")?;
        if self.storage.get_question(question_id).await?.is_none() {
            return Err(PathwiseError::NotFound(format!("question {}", question_id)));
        }
        let now = Utc::now();
        let answer = CommunityAnswer {
            id: AnswerId::new(),
            question_id,
            user_id,
            answer,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_answer(&answer).await?;
        debug!("{} answered question {}", user_id, question_id);
        Ok(answer)
    }

    pub async fn edit_answer(
        &self,
        user_id: UserId,
        id: AnswerId,
        text: &str,
    ) -> Result<CommunityAnswer> {
        let mut existing = self.authored_answer(user_id, id).await?;
        existing.answer = Self::required(text, "Answer")?;
        existing.updated_at = Utc::now();
        self.storage.update_answer(&existing).await?;
        Ok(existing)
    }

    pub async fn delete_answer(&self, user_id: UserId, id: AnswerId) -> Result<()> {
        self.authored_answer(user_id, id).await?;
        self.storage.delete_answer(id).await
    }

    /// All threads, newest question first, answers oldest first
    pub async fn threads(&self) -> Result<Vec<QuestionThread>> {
        let questions = self.storage.list_questions().await?;
        let mut names: HashMap<UserId, String> = HashMap::new();
        let mut threads = Vec::with_capacity(questions.len());

        for question in questions {
            let answers = self.storage.list_answers(question.id).await?;
            let mut answer_views = Vec::with_capacity(answers.len());
            for answer in answers {
                let author_name = self.author_name(&mut names, answer.user_id).await?;
                answer_views.push(AnswerView {
                    answer,
                    author_name,
                });
            }
            let author_name = self.author_name(&mut names, question.user_id).await?;
            threads.push(QuestionThread {
                question,
                author_name,
                answers: answer_views,
            });
        }
        Ok(threads)
    }

    async fn author_name(
        &self,
        cache: &mut HashMap<UserId, String>,
        user_id: UserId,
    ) -> Result<String> {
        if let Some(name) = cache.get(&user_id) {
            return Ok(name.clone());
        }
        let name = self
            .storage
            .get_profile(user_id)
            .await?
            .map(|p| p.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        cache.insert(user_id, name.clone());
        Ok(name)
    }
}
