//! HTTP API server with SSE support

use super::events::Event;
use super::handlers;
use super::state::AppState;
use crate::app::PathwiseApp;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Heartbeat period of the event stream
const HEARTBEAT_SECS: u64 = 10;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// Build the router over shared state.
///
/// Everything except `/health`, `/auth/register`, `/auth/login` and
/// `/paths` requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Identity
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        // Event streaming
        .route("/events", get(handlers::events))
        // Roadmap
        .route("/dashboard", get(handlers::dashboard))
        .route("/progress", get(handlers::progress))
        .route("/roadmap", get(handlers::roadmap))
        .route("/roadmap/replace", post(handlers::replace_roadmap))
        .route(
            "/roadmap/modules/:id/complete",
            post(handlers::complete_module),
        )
        .route("/paths", get(handlers::paths))
        .route("/paths/select", post(handlers::select_path))
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        // Goals
        .route(
            "/goals",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/goals/:id",
            put(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:id/status", post(handlers::set_goal_status))
        // Community
        .route(
            "/community/questions",
            get(handlers::list_threads).post(handlers::ask_question),
        )
        .route(
            "/community/questions/:id",
            put(handlers::edit_question).delete(handlers::delete_question),
        )
        .route(
            "/community/questions/:id/answers",
            post(handlers::answer_question),
        )
        .route(
            "/community/answers/:id",
            put(handlers::edit_answer).delete(handlers::delete_answer),
        )
        // Mentorship
        .route("/mentors", get(handlers::list_mentors))
        .route("/mentors/sessions", get(handlers::list_sessions))
        .route("/mentors/:id/book", post(handlers::book_mentor))
        .route("/mentor-applications", post(handlers::apply_as_mentor))
        .with_state(state)
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    /// Shutdown signal for background tasks
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
    /// Heartbeat task handle for cleanup
    heartbeat_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(app: PathwiseApp, config: ApiServerConfig) -> Self {
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            state: AppState::new(app),
            shutdown_tx,
            heartbeat_handle: None,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.state.instance_id
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    fn spawn_heartbeat(&mut self) {
        let events = self.state.app.events.clone();
        let instance_id = self.state.instance_id.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.heartbeat_handle = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(HEARTBEAT_SECS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        events.broadcast(Event::heartbeat(instance_id.clone()));
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Heartbeat task received shutdown signal");
                        break;
                    }
                }
            }
        }));
    }

    /// Serve until Ctrl-C
    pub async fn serve(mut self) -> anyhow::Result<()> {
        let router = self.router();
        self.spawn_heartbeat();

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!(
            "API server [{}] listening on http://{}",
            self.state.instance_id, self.config.addr
        );

        let shutdown_tx = self.shutdown_tx.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down API server");
                let _ = shutdown_tx.send(());
            })
            .await?;
        Ok(())
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.heartbeat_handle.take() {
            handle.abort();
            debug!("ApiServer dropped - heartbeat task aborted");
        }
    }
}
