//! HTTP API and event streaming
//!
//! Provides:
//! - JSON routes over the workflow services, bearer-token authenticated
//! - Server-Sent Events scoped to the signed-in user
//! - The event broadcaster used by every service

pub mod error;
pub mod events;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use events::{Event, EventBroadcaster, EventType, Subscription};
pub use server::{build_router, ApiServer, ApiServerConfig};
pub use state::{AppState, AuthUser};
