//! Shared handler state and request authentication

use super::error::ApiError;
use crate::app::PathwiseApp;
use crate::error::PathwiseError;
use crate::types::UserId;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use serde::Deserialize;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub app: PathwiseApp,
    /// Short id of this server instance, reported by heartbeats and `/health`
    pub instance_id: String,
}

impl AppState {
    pub fn new(app: PathwiseApp) -> Self {
        Self {
            app,
            instance_id: uuid::Uuid::new_v4().to_string()[..8].to_string(),
        }
    }
}

/// Caller resolved from `Authorization: Bearer <token>`.
///
/// `?token=` is accepted as well since browser `EventSource` cannot set
/// headers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn query_token(uri: &Uri) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(uri).ok()?;
    query.token.filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| query_token(&parts.uri))
            .ok_or(PathwiseError::Unauthorized)?;
        let user_id = state.app.auth.get_user(&token).await?;
        Ok(AuthUser { user_id, token })
    }
}
