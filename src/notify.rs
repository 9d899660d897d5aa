//! User-facing notifications
//!
//! Execution outcomes and warnings are fanned out to every interested listener
//! (the CLI prints them). Nobody listening is not an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast hub for [`Notification`]s
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(
        &self,
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        };
        tracing::debug!(
            level = ?notification.level,
            title = %notification.title,
            "Notification"
        );
        let _ = self.sender.send(notification.clone());
        notification
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Success, title, message)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Error, title, message)
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Warning, title, message)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
