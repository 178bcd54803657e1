//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use pathwise_core::{
    auth::SignedIn,
    error::{PathwiseError, Result},
    profile::Registration,
    roadmap::Catalog,
    services::PredictionInput,
    ConnectionMode, DifficultyPredictor, ExperienceLevel, LibsqlStorage, PathwiseApp,
    PathwiseConfig, Profile,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse";

/// Predictor returning a fixed difficulty, or failing when `None`
pub struct StubPredictor {
    difficulty: Option<i64>,
    calls: AtomicUsize,
}

impl StubPredictor {
    pub fn fixed(difficulty: i64) -> Arc<Self> {
        Arc::new(Self {
            difficulty: Some(difficulty),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            difficulty: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DifficultyPredictor for StubPredictor {
    async fn predict(&self, _input: &PredictionInput) -> Result<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.difficulty
            .ok_or_else(|| PathwiseError::Predictor("connection refused".to_string()))
    }
}

/// Create a migrated libSQL store on a temporary file.
///
/// libSQL's `:memory:` mode creates isolated databases per connection, so
/// migrations would not persist. Keep the `TempDir` alive for the test.
pub async fn create_test_storage() -> (Arc<LibsqlStorage>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("pathwise.db");
    let storage = LibsqlStorage::new_with_validation(
        ConnectionMode::Local(path.display().to_string()),
        true, // create_if_missing - required for test databases
    )
    .await
    .expect("Failed to create test storage");
    (Arc::new(storage), dir)
}

/// App over a fresh store, the bundled catalog and the given predictor
pub async fn create_test_app(predictor: Arc<dyn DifficultyPredictor>) -> (PathwiseApp, TempDir) {
    create_test_app_with_config(PathwiseConfig::default(), predictor).await
}

pub async fn create_test_app_with_config(
    config: PathwiseConfig,
    predictor: Arc<dyn DifficultyPredictor>,
) -> (PathwiseApp, TempDir) {
    let (storage, dir) = create_test_storage().await;
    let catalog = Catalog::bundled().expect("Bundled catalog should parse");
    let app = PathwiseApp::from_parts(config, storage, Arc::new(catalog), predictor);
    (app, dir)
}

/// Register an account with a profile and sign it in
pub async fn register_user(
    app: &PathwiseApp,
    email: &str,
    name: &str,
    goal: &str,
) -> (Profile, SignedIn) {
    let profile = app
        .profiles
        .register(Registration {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            name: name.to_string(),
            goal: goal.to_string(),
            experience_level: ExperienceLevel::Junior,
        })
        .await
        .expect("Registration should succeed");
    let session = app
        .auth
        .sign_in(email, PASSWORD)
        .await
        .expect("Sign-in should succeed");
    (profile, session)
}
