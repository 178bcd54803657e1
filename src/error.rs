//! Error types for PathWise
//!
//! Structured error definitions with thiserror. Store failures are classified
//! from the database message so callers can surface meaningful text to the
//! end user instead of a raw driver error.

use thiserror::Error;

/// Classification of a failed store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Unique, check or not-null constraint violated
    Constraint,
    /// Read-only database or missing write permission
    PermissionDenied,
    /// Table missing (schema not migrated)
    MissingTable,
    /// Anything else the driver reported
    Other,
}

impl StoreErrorKind {
    /// Classify a driver error message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("constraint failed") || lower.contains("constraint violation") {
            StoreErrorKind::Constraint
        } else if lower.contains("readonly")
            || lower.contains("read-only")
            || lower.contains("permission")
        {
            StoreErrorKind::PermissionDenied
        } else if lower.contains("no such table") {
            StoreErrorKind::MissingTable
        } else {
            StoreErrorKind::Other
        }
    }
}

/// Main error type for PathWise operations
#[derive(Error, Debug)]
pub enum PathwiseError {
    /// Connection or setup failure of the database
    #[error("Database error: {0}")]
    Database(String),

    /// A store operation was rejected
    #[error("Store error ({kind:?}): {message}")]
    Store {
        kind: StoreErrorKind,
        message: String,
    },

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Difficulty predictor call failed
    #[error("Predictor error: {0}")]
    Predictor(String),

    /// Input rejected before reaching the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing, expired or unknown session
    #[error("Not signed in")]
    Unauthorized,

    /// Email/password pair did not match
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Caller is not the author/owner of the row
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No profile row for the user
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Roadmap module not found for this user
    #[error("Roadmap module not found: {0}")]
    ModuleNotFound(String),

    /// Mentor not found
    #[error("Mentor not found: {0}")]
    MentorNotFound(String),

    /// Generic missing row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog document could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid identifier format
    #[error("Invalid ID: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl PathwiseError {
    /// Build a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PathwiseError::Validation(message.into())
    }

    /// Text suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            PathwiseError::Store { kind, message } => match kind {
                StoreErrorKind::MissingTable => {
                    "Database table not found. Please run `pathwise init` to create the schema."
                        .to_string()
                }
                StoreErrorKind::PermissionDenied => {
                    "Permission denied. Please check database permissions.".to_string()
                }
                StoreErrorKind::Constraint => {
                    format!("The change conflicts with existing data: {}", message)
                }
                StoreErrorKind::Other => format!("Request failed: {}", message),
            },
            PathwiseError::Validation(message) => message.clone(),
            PathwiseError::Unauthorized => "Please sign in first.".to_string(),
            PathwiseError::InvalidCredentials => "Invalid email or password.".to_string(),
            PathwiseError::Forbidden(_) => {
                "You can only change content you created.".to_string()
            }
            PathwiseError::Predictor(_) => {
                "The personalization engine is unavailable. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<libsql::Error> for PathwiseError {
    fn from(err: libsql::Error) -> Self {
        let message = err.to_string();
        PathwiseError::Store {
            kind: StoreErrorKind::classify(&message),
            message,
        }
    }
}

/// Convert anyhow::Error to PathwiseError
impl From<anyhow::Error> for PathwiseError {
    fn from(err: anyhow::Error) -> Self {
        PathwiseError::Other(err.to_string())
    }
}

/// Result type alias for PathWise operations
pub type Result<T> = std::result::Result<T, PathwiseError>;
