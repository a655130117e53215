//! Notification sink for fill runs. Fire-and-forget, auto-dismissing.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub dismiss_at: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Per-session notification log. Entries are dismissed once their time to
/// live has passed.
pub struct NotificationLog {
    ttl: chrono::Duration,
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1)),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Notifications still on screen now; dismissed ones are dropped.
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| entry.dismiss_at > now);
        entries.clone()
    }

    fn push_at(&self, message: &str, severity: Severity, now: DateTime<Utc>) {
        let notification = Notification {
            message: message.to_string(),
            severity,
            created_at: now,
            dismiss_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| entry.dismiss_at > now);
        entries.push(notification);
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, message: &str, severity: Severity) {
        info!(?severity, message, "notification");
        self.push_at(message, severity, Utc::now());
    }
}
