//! Mapping of domain errors onto HTTP responses

use crate::error::{PathwiseError, StoreErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

/// Handler error; renders as `{"error": <user message>}`
#[derive(Debug)]
pub struct ApiError(pub PathwiseError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PathwiseError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PathwiseError::InvalidId(_) | PathwiseError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            PathwiseError::Unauthorized | PathwiseError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            PathwiseError::Forbidden(_) => StatusCode::FORBIDDEN,
            PathwiseError::ProfileNotFound(_)
            | PathwiseError::ModuleNotFound(_)
            | PathwiseError::MentorNotFound(_)
            | PathwiseError::NotFound(_) => StatusCode::NOT_FOUND,
            PathwiseError::Store {
                kind: StoreErrorKind::Constraint,
                ..
            } => StatusCode::CONFLICT,
            PathwiseError::Predictor(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PathwiseError> for ApiError {
    fn from(err: PathwiseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            debug!("Request rejected ({}): {}", status, self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.user_message(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
