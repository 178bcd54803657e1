//! Event types, the broadcaster and user-scoped subscriptions
//!
//! Workflow services publish progress signals here; views (the SSE endpoint,
//! CLI watchers, tests) subscribe for one user and receive only that user's
//! events plus unscoped ones such as heartbeats. Dropping a [`Subscription`]
//! unsubscribes.

use crate::types::{MentorId, MentorSessionId, ModuleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt as _};
use tracing::debug;

/// Event type discriminant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventType {
    /// User signed in
    SessionStarted { timestamp: DateTime<Utc> },
    /// User signed out
    SessionEnded { timestamp: DateTime<Utc> },
    /// Roadmap completion state changed; views should refetch
    ProgressUpdated {
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(default)]
        module_id: Option<ModuleId>,
        timestamp: DateTime<Utc>,
    },
    /// Credibility score recomputed
    CredibilityUpdated {
        credibility: u8,
        timestamp: DateTime<Utc>,
    },
    /// Roadmap generated for a topic
    RoadmapGenerated {
        topic: String,
        modules: usize,
        difficulty: i64,
        timestamp: DateTime<Utc>,
    },
    /// Career path switched and previous roadmaps removed
    RoadmapReset {
        topic: String,
        removed: u64,
        timestamp: DateTime<Utc>,
    },
    /// Mentor session booked
    MentorBooked {
        mentor_id: MentorId,
        session_id: MentorSessionId,
        timestamp: DateTime<Utc>,
    },
    /// Heartbeat (published periodically while serving)
    Heartbeat {
        #[serde(default)]
        instance_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

/// Event wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event ID (for deduplication)
    pub id: String,
    /// Owning user; unscoped events reach every subscriber
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Event payload
    #[serde(flatten)]
    pub event_type: EventType,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            event_type,
        }
    }

    pub fn for_user(user_id: UserId, event_type: EventType) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::new(event_type)
        }
    }

    pub fn session_started(user_id: UserId) -> Self {
        Self::for_user(
            user_id,
            EventType::SessionStarted {
                timestamp: Utc::now(),
            },
        )
    }

    pub fn session_ended(user_id: UserId) -> Self {
        Self::for_user(
            user_id,
            EventType::SessionEnded {
                timestamp: Utc::now(),
            },
        )
    }

    pub fn progress_updated(user_id: UserId, module_id: Option<ModuleId>) -> Self {
        Self::for_user(
            user_id,
            EventType::ProgressUpdated {
                module_id,
                timestamp: Utc::now(),
            },
        )
    }

    pub fn credibility_updated(user_id: UserId, credibility: u8) -> Self {
        Self::for_user(
            user_id,
            EventType::CredibilityUpdated {
                credibility,
                timestamp: Utc::now(),
            },
        )
    }

    pub fn roadmap_generated(
        user_id: UserId,
        topic: String,
        modules: usize,
        difficulty: i64,
    ) -> Self {
        Self::for_user(
            user_id,
            EventType::RoadmapGenerated {
                topic,
                modules,
                difficulty,
                timestamp: Utc::now(),
            },
        )
    }

    pub fn roadmap_reset(user_id: UserId, topic: String, removed: u64) -> Self {
        Self::for_user(
            user_id,
            EventType::RoadmapReset {
                topic,
                removed,
                timestamp: Utc::now(),
            },
        )
    }

    pub fn mentor_booked(
        user_id: UserId,
        mentor_id: MentorId,
        session_id: MentorSessionId,
    ) -> Self {
        Self::for_user(
            user_id,
            EventType::MentorBooked {
                mentor_id,
                session_id,
                timestamp: Utc::now(),
            },
        )
    }

    pub fn heartbeat(instance_id: String) -> Self {
        Self::new(EventType::Heartbeat {
            instance_id: Some(instance_id),
            timestamp: Utc::now(),
        })
    }

    /// Whether a subscriber scoped to `user_id` should see this event
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }

    /// Convert to SSE data format
    pub fn to_sse(&self) -> String {
        format!(
            "id: {}\ndata: {}\n\n",
            self.id,
            serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string())
        )
    }
}

/// Event broadcaster using tokio broadcast channel
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<Event>,
}

impl EventBroadcaster {
    /// Create new broadcaster with channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Broadcast event to all subscribers, returning how many received it
    pub fn broadcast(&self, event: Event) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(err) => {
                // No subscribers, expected when no view is mounted
                debug!("No subscribers for event {:?}", err.0.event_type);
                0
            }
        }
    }

    /// Subscribe to the events of one user
    pub fn subscribe(&self, user_id: UserId) -> Subscription {
        Subscription {
            user_id,
            rx: self.tx.subscribe(),
        }
    }

    /// Every event regardless of owner
    #[cfg(test)]
    pub(crate) fn subscribe_unscoped(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Get subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Receiver scoped to one user; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    user_id: UserId,
    rx: broadcast::Receiver<Event>,
}

impl Subscription {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Next event for this user; `None` once the broadcaster is gone.
    /// Lagged receivers skip the missed events.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.is_visible_to(self.user_id) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Subscription for {} lagged, skipped {} events", self.user_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued event for this user, if any
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.is_visible_to(self.user_id) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Stream of this user's events
    pub fn into_stream(self) -> impl Stream<Item = Event> {
        let user_id = self.user_id;
        BroadcastStream::new(self.rx).filter_map(move |result| match result {
            Ok(event) if event.is_visible_to(user_id) => Some(event),
            // Skip other users' events and lagged messages
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let user = UserId::new();
        let event = Event::credibility_updated(user, 40);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "credibility_updated");
        assert_eq!(json["credibility"], 40);
        assert_eq!(json["user_id"], user.to_string());
    }

    #[test]
    fn test_sse_format() {
        let event = Event::progress_updated(UserId::new(), None);
        let sse = event.to_sse();
        assert!(sse.starts_with("id:"));
        assert!(sse.contains("data:"));
        assert!(sse.contains("progress_updated"));
    }

    #[tokio::test]
    async fn test_subscription_sees_only_own_events() {
        let broadcaster = EventBroadcaster::new(16);
        let alice = UserId::new();
        let bob = UserId::new();
        let mut alice_sub = broadcaster.subscribe(alice);

        broadcaster.broadcast(Event::progress_updated(bob, None));
        broadcaster.broadcast(Event::credibility_updated(alice, 10));
        broadcaster.broadcast(Event::heartbeat("test".into()));

        let first = alice_sub.recv().await.unwrap();
        assert!(matches!(first.event_type, EventType::CredibilityUpdated { credibility: 10, .. }));
        let second = alice_sub.recv().await.unwrap();
        assert!(matches!(second.event_type, EventType::Heartbeat { .. }));
        assert!(alice_sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let broadcaster = EventBroadcaster::default();
        let sub = broadcaster.subscribe(UserId::new());
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
        assert_eq!(broadcaster.broadcast(Event::heartbeat("idle".into())), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscription_skips_missed_events() {
        let broadcaster = EventBroadcaster::new(2);
        let user = UserId::new();
        let mut sub = broadcaster.subscribe(user);
        for credibility in [10, 20, 30, 40] {
            broadcaster.broadcast(Event::credibility_updated(user, credibility));
        }
        let event = sub.recv().await.unwrap();
        assert!(matches!(event.event_type, EventType::CredibilityUpdated { credibility: 30, .. }));
    }
}
