//! User-visible moderation notices.
//!
//! The gate only enqueues; storage and delivery belong to the forum's
//! notification subsystem. The server hands notices to it through
//! [`TracingNotificationSink`]; [`InMemoryNotificationSink`] keeps them for
//! inspection in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::ids::{CommunityId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A violation with plenty of attempts left.
    Violation,
    /// A violation close to the ban threshold.
    Warning,
    Ban,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Medium,
    High,
}

impl NotificationKind {
    pub fn priority(self) -> Priority {
        match self {
            NotificationKind::Ban => Priority::High,
            NotificationKind::Violation | NotificationKind::Warning => Priority::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Violation => "violation",
            NotificationKind::Warning => "warning",
            NotificationKind::Ban => "ban",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    /// Thread the offending content belonged to, if any.
    pub related_id: Option<String>,
    pub community_id: CommunityId,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        message: String,
        related_id: Option<String>,
        community_id: CommunityId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            message,
            related_id,
            community_id,
            created_at,
            read: false,
        }
    }

    pub fn priority(&self) -> Priority {
        self.kind.priority()
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification sink unavailable: {reason}")]
    Unavailable { reason: String },
}

#[async_trait]
/// Fire-and-forget notification enqueue.
pub trait NotificationSink: Send + Sync {
    async fn enqueue(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Keeps every notification in memory, in enqueue order.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    notifications: Mutex<Vec<Notification>>,
    #[cfg(any(test, feature = "mock"))]
    fail: std::sync::atomic::AtomicBool,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent enqueues fail.
    #[cfg(any(test, feature = "mock"))]
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "mock"))]
    fn is_failing(&self) -> bool {
        self.fail.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(any(test, feature = "mock")))]
    fn is_failing(&self) -> bool {
        false
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn for_recipient(&self, recipient: &UserId) -> Vec<Notification> {
        self.notifications
            .lock()
            .iter()
            .filter(|n| &n.recipient_id == recipient)
            .cloned()
            .collect()
    }

    pub fn unread_count(&self, recipient: &UserId) -> usize {
        self.notifications
            .lock()
            .iter()
            .filter(|n| &n.recipient_id == recipient && !n.read)
            .count()
    }

    /// Returns how many were newly marked.
    pub fn mark_all_read(&self, recipient: &UserId) -> usize {
        let mut marked = 0;
        for n in self.notifications.lock().iter_mut() {
            if &n.recipient_id == recipient && !n.read {
                n.read = true;
                marked += 1;
            }
        }
        marked
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.is_failing() {
            return Err(NotificationError::Unavailable {
                reason: "sink is failing".to_string(),
            });
        }
        self.notifications.lock().push(notification);
        Ok(())
    }
}

/// Target of the structured notice events emitted by [`TracingNotificationSink`].
pub const NOTIFICATION_LOG_TARGET: &str = "asksphere::notification";

/// Forwards each notice as one structured `tracing` event and keeps nothing.
///
/// The log pipeline (collector, shipper) is the hand-off to the notification
/// subsystem; filter on [`NOTIFICATION_LOG_TARGET`] to route the events.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            target: NOTIFICATION_LOG_TARGET,
            id = %notification.id,
            recipient_id = %notification.recipient_id,
            community_id = %notification.community_id,
            kind = notification.kind.as_str(),
            priority = ?notification.priority(),
            related_id = notification.related_id.as_deref(),
            created_at = %notification.created_at,
            message = %notification.message,
            "Notification enqueued"
        );
        Ok(())
    }
}
