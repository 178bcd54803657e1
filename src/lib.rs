//! PathWise - personalized career learning roadmaps
//!
//! Users pick a career path and receive an ordered roadmap of learning
//! modules whose difficulty is chosen by an external predictor from their
//! activity metrics. Completing modules unlocks the next one, raises the
//! progress percentage and credibility score, and feeds back into the
//! metrics.
//!
//! # Architecture
//!
//! - **Types**: Core records (Profile, RoadmapModule, ActivityLog, ...)
//! - **Storage**: libSQL backend behind the `StorageBackend` trait
//! - **Services**: Difficulty predictor client
//! - **Roadmap**: Catalog, generator, completion state machine, career paths
//! - **Features**: dashboard, goals, community Q&A, mentorship, profiles
//! - **Surfaces**: `api` (axum HTTP + SSE) and the `pathwise` CLI binary
//!
//! # Example
//!
//! ```ignore
//! use pathwise_core::{app::PathwiseApp, config::PathwiseConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = PathwiseApp::open(PathwiseConfig::load(None)?, true).await?;
//!     let user = app.auth.get_user(&token).await?;
//!     let dashboard = app.dashboard.load(user).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod community;
pub mod config;
pub mod credibility;
pub mod dashboard;
pub mod error;
pub mod goals;
pub mod mentorship;
pub mod metrics;
pub mod profile;
pub mod roadmap;
pub mod services;
pub mod session;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use app::PathwiseApp;
pub use config::PathwiseConfig;
pub use error::{PathwiseError, Result};
pub use services::{DifficultyPredictor, HttpDifficultyPredictor};
pub use storage::{libsql::ConnectionMode, libsql::LibsqlStorage, StorageBackend};
pub use types::{
    ActivityAction, ActivityLog, ExperienceLevel, ModuleId, Profile, RoadmapModule, UserId,
    UserMetrics,
};
