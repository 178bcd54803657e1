//! Client session state and route gating
//!
//! [`SessionManager`] holds the signed-in session of one client and publishes
//! every change on a watch channel, so views re-render on sign-in and
//! sign-out without polling.

use crate::api::events::{Event, EventBroadcaster};
use crate::auth::SignedIn;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<SignedIn> for CurrentSession {
    fn from(signed_in: SignedIn) -> Self {
        Self {
            user_id: signed_in.user_id,
            token: signed_in.token,
            expires_at: signed_in.expires_at,
        }
    }
}

pub struct SessionManager {
    tx: watch::Sender<Option<CurrentSession>>,
    events: EventBroadcaster,
}

impl SessionManager {
    pub fn new(events: EventBroadcaster) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, events }
    }

    /// Seed with a session persisted by an earlier run, without announcing it
    pub fn restore(&self, session: CurrentSession) {
        debug!("Restored session of {}", session.user_id);
        self.tx.send_replace(Some(session));
    }

    /// Replace the current session and announce it
    pub fn start(&self, session: impl Into<CurrentSession>) {
        let session = session.into();
        let user_id = session.user_id;
        if let Some(previous) = self.tx.send_replace(Some(session)) {
            if previous.user_id != user_id {
                self.events.broadcast(Event::session_ended(previous.user_id));
            }
        }
        debug!("Session started for {}", user_id);
        self.events.broadcast(Event::session_started(user_id));
    }

    /// Clear the session, returning the one that ended
    pub fn end(&self) -> Option<CurrentSession> {
        let previous = self.tx.send_replace(None);
        if let Some(session) = &previous {
            debug!("Session ended for {}", session.user_id);
            self.events.broadcast(Event::session_ended(session.user_id));
        }
        previous
    }

    pub fn current(&self) -> Option<CurrentSession> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn watch(&self) -> watch::Receiver<Option<CurrentSession>> {
        self.tx.subscribe()
    }
}

/// Client routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Pricing,
    Paths,
    Dashboard,
    Roadmap,
    Goals,
    Mentorship,
    Community,
    Progress,
    Profile,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Home,
        Route::Login,
        Route::Register,
        Route::Pricing,
        Route::Paths,
        Route::Dashboard,
        Route::Roadmap,
        Route::Goals,
        Route::Mentorship,
        Route::Community,
        Route::Progress,
        Route::Profile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Pricing => "/pricing",
            Route::Paths => "/paths",
            Route::Dashboard => "/dashboard",
            Route::Roadmap => "/roadmap",
            Route::Goals => "/goals",
            Route::Mentorship => "/mentorship",
            Route::Community => "/community",
            Route::Progress => "/progress",
            Route::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Needs a session
    pub fn is_gated(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::Roadmap
                | Route::Goals
                | Route::Mentorship
                | Route::Community
                | Route::Progress
                | Route::Profile
        )
    }

    /// Only shown to signed-out visitors
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Decide what a path shows given whether a session exists
pub fn resolve(path: &str, signed_in: bool) -> Navigation {
    match Route::from_path(path) {
        None => Navigation::Redirect(Route::Home),
        Some(route) if route.is_gated() && !signed_in => Navigation::Redirect(Route::Login),
        Some(route) if route.is_guest_only() && signed_in => Navigation::Redirect(Route::Dashboard),
        Some(route) => Navigation::Render(route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::EventType;
    use chrono::Duration;

    fn signed_in(user_id: UserId) -> SignedIn {
        SignedIn {
            token: "t0ken".into(),
            user_id,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn test_route_gating() {
        let gated = [
            "/dashboard",
            "/roadmap",
            "/goals",
            "/mentorship",
            "/community",
            "/progress",
            "/profile",
        ];
        for path in gated {
            assert_eq!(resolve(path, false), Navigation::Redirect(Route::Login), "{path}");
            assert!(matches!(resolve(path, true), Navigation::Render(_)), "{path}");
        }

        assert_eq!(resolve("/login", true), Navigation::Redirect(Route::Dashboard));
        assert_eq!(resolve("/register", true), Navigation::Redirect(Route::Dashboard));
        assert_eq!(resolve("/login", false), Navigation::Render(Route::Login));
        assert_eq!(resolve("/paths", false), Navigation::Render(Route::Paths));
        assert_eq!(resolve("/", true), Navigation::Render(Route::Home));
        assert_eq!(resolve("/nowhere", true), Navigation::Redirect(Route::Home));
        assert_eq!(resolve("/goals/", true), Navigation::Render(Route::Goals));
    }

    #[tokio::test]
    async fn test_watchers_see_sign_in_and_out() {
        let events = EventBroadcaster::default();
        let user = UserId::new();
        let mut sub = events.subscribe(user);
        let manager = SessionManager::new(events);
        let mut watcher = manager.watch();

        manager.start(signed_in(user));
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow().as_ref().map(|s| s.user_id), Some(user));
        assert!(manager.is_signed_in());

        let ended = manager.end().unwrap();
        assert_eq!(ended.user_id, user);
        watcher.changed().await.unwrap();
        assert!(watcher.borrow().is_none());
        assert!(manager.end().is_none());

        let started = sub.try_recv().unwrap();
        assert!(matches!(started.event_type, EventType::SessionStarted { .. }));
        let ended = sub.try_recv().unwrap();
        assert!(matches!(ended.event_type, EventType::SessionEnded { .. }));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_switching_users_ends_the_restored_session() {
        let events = EventBroadcaster::default();
        let (first, second) = (UserId::new(), UserId::new());
        let mut first_sub = events.subscribe(first);
        let mut second_sub = events.subscribe(second);
        let manager = SessionManager::new(events);

        manager.restore(signed_in(first).into());
        assert!(manager.is_signed_in());
        assert!(first_sub.try_recv().is_none());

        manager.start(signed_in(second));
        assert_eq!(manager.current().map(|s| s.user_id), Some(second));
        let ended = first_sub.try_recv().unwrap();
        assert!(matches!(ended.event_type, EventType::SessionEnded { .. }));
        let started = second_sub.try_recv().unwrap();
        assert!(matches!(started.event_type, EventType::SessionStarted { .. }));
    }
}
