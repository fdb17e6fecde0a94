//! Change notification for connected clients.
//!
//! Mutations report a [`MutationKind`]; the kind maps to the set of topics
//! whose subscribers need to re-fetch. Events fan out on a tokio broadcast
//! channel so delivery stays decoupled from the aggregation path, which is
//! pure and synchronous.

use serde::Serialize;
use tokio::sync::broadcast;

/// Categories of mutations that affect subscribable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// A list was created, renamed, recolored, rescheduled, or deleted.
    ListChanged,
    /// A todo item was added, edited, toggled, or removed.
    TodoChanged,
    /// A user was registered or their stats record was rewritten.
    UserChanged,
}

impl MutationKind {
    /// Topics whose subscribers are affected by this kind of mutation.
    ///
    /// Any mutation that can move counters also touches `stats` and
    /// `leaderboard`, since stats are recomputed on every write.
    pub fn affected_topics(&self) -> &'static [&'static str] {
        match self {
            MutationKind::ListChanged => &["lists", "stats", "leaderboard"],
            MutationKind::TodoChanged => &["lists", "stats", "leaderboard"],
            MutationKind::UserChanged => &["stats", "leaderboard"],
        }
    }
}

/// A change event delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub kind: MutationKind,
    /// The user whose data changed.
    pub user_id: String,
}

impl ChangeEvent {
    /// True if any of this event's topics is in `topics`.
    pub fn matches(&self, topics: &[String]) -> bool {
        self.kind
            .affected_topics()
            .iter()
            .any(|t| topics.iter().any(|s| s == t))
    }
}

/// Fan-out bus for change events.
///
/// Cheap to clone; slow receivers drop events rather than blocking writers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Silently a no-op when nobody is subscribed.
    pub fn publish(&self, kind: MutationKind, user_id: &str) {
        let _ = self.tx.send(ChangeEvent {
            kind,
            user_id: user_id.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
