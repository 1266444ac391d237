//! Toast notifications for timer lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Created,
    Deleted,
    Completed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Created => "created",
            NotificationKind::Deleted => "deleted",
            NotificationKind::Completed => "completed",
        }
    }
}

/// Fire-and-forget message shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn created(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Created,
            title: "Timer Created".to_string(),
            description: format!("{} timer has been created.", name),
            timestamp,
        }
    }

    pub fn deleted(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Deleted,
            title: "Timer Deleted".to_string(),
            description: format!("{} has been deleted.", name),
            timestamp,
        }
    }

    pub fn completed(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::Completed,
            title: "Timer Completed!".to_string(),
            description: format!("{} has finished.", name),
            timestamp,
        }
    }
}
