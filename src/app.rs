//! Service wiring shared by the CLI and the HTTP API

use crate::api::events::EventBroadcaster;
use crate::auth::AuthService;
use crate::community::CommunityService;
use crate::config::PathwiseConfig;
use crate::dashboard::DashboardService;
use crate::error::Result;
use crate::goals::GoalService;
use crate::mentorship::MentorshipService;
use crate::profile::ProfileService;
use crate::roadmap::{CareerPathService, Catalog, ProgressionService, RoadmapGenerator};
use crate::services::{DifficultyPredictor, HttpDifficultyPredictor};
use crate::storage::libsql::{ConnectionMode, LibsqlStorage};
use crate::storage::StorageBackend;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// `<data dir>/pathwise/pathwise.db`, or `./pathwise.db` without a data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("pathwise"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pathwise.db")
}

/// Every service over one store, catalog and event bus
#[derive(Clone)]
pub struct PathwiseApp {
    pub config: Arc<PathwiseConfig>,
    pub storage: Arc<dyn StorageBackend>,
    pub catalog: Arc<Catalog>,
    pub events: EventBroadcaster,
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
    pub progression: Arc<ProgressionService>,
    pub careers: Arc<CareerPathService>,
    pub generator: Arc<RoadmapGenerator>,
    pub dashboard: Arc<DashboardService>,
    pub goals: Arc<GoalService>,
    pub community: Arc<CommunityService>,
    pub mentorship: Arc<MentorshipService>,
}

impl PathwiseApp {
    /// Connect to the configured store (migrating it) and build the services.
    ///
    /// With `create_if_missing` a missing local database file is created.
    pub async fn open(config: PathwiseConfig, create_if_missing: bool) -> Result<Self> {
        let url = config
            .database
            .url
            .clone()
            .unwrap_or_else(|| default_database_path().to_string_lossy().into_owned());
        info!("Opening database at {}", url);

        let storage =
            LibsqlStorage::new_with_validation(ConnectionMode::from_url(&url)?, create_if_missing)
                .await?;
        let catalog = Catalog::load(&config.catalog)?;
        let predictor = HttpDifficultyPredictor::new(&config.predictor)?;

        Ok(Self::from_parts(
            config,
            Arc::new(storage),
            Arc::new(catalog),
            Arc::new(predictor),
        ))
    }

    pub fn from_parts(
        config: PathwiseConfig,
        storage: Arc<dyn StorageBackend>,
        catalog: Arc<Catalog>,
        predictor: Arc<dyn DifficultyPredictor>,
    ) -> Self {
        let events = EventBroadcaster::new(config.events.capacity);

        let auth = Arc::new(AuthService::new(storage.clone(), &config.auth));
        let profiles = Arc::new(ProfileService::new(auth.clone(), storage.clone()));
        let progression = Arc::new(ProgressionService::new(storage.clone(), events.clone()));
        let generator = Arc::new(RoadmapGenerator::new(
            catalog.clone(),
            storage.clone(),
            events.clone(),
        ));
        let careers = Arc::new(CareerPathService::new(
            catalog.clone(),
            storage.clone(),
            events.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(
            storage.clone(),
            progression.clone(),
            generator.clone(),
            predictor,
            config.predictor.fallback(),
        ));
        let goals = Arc::new(GoalService::new(storage.clone()));
        let community = Arc::new(CommunityService::new(storage.clone()));
        let mentorship = Arc::new(MentorshipService::new(
            catalog.clone(),
            storage.clone(),
            events.clone(),
        ));

        Self {
            config: Arc::new(config),
            storage,
            catalog,
            events,
            auth,
            profiles,
            progression,
            careers,
            generator,
            dashboard,
            goals,
            community,
            mentorship,
        }
    }
}
