//! Live documents under fill, one per browser tab.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::dom::Document;
use crate::fill::notify::NotificationLog;
use crate::fill::orchestrator::{FillDeps, FillOrchestrator, FillState};

pub struct FillSession {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub document: Arc<RwLock<Document>>,
    pub notifications: Arc<NotificationLog>,
    pub orchestrator: FillOrchestrator,
    /// Last open or lookup; drives idle expiry.
    last_seen: Mutex<DateTime<Utc>>,
}

impl FillSession {
    /// Serialized document with current live values.
    pub fn html(&self) -> String {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_html()
    }

    pub fn change_events(&self) -> usize {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events()
            .iter()
            .filter(|event| event.kind == "change")
            .count()
    }

    fn touch(&self, now: DateTime<Utc>) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    fn idle_since(&self) -> DateTime<Utc> {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sessions not looked up for `idle_ttl` are dropped on the next open or lookup.
pub struct SessionRegistry {
    deps: FillDeps,
    notification_ttl: Duration,
    idle_ttl: chrono::Duration,
    sessions: RwLock<HashMap<Uuid, Arc<FillSession>>>,
}

impl SessionRegistry {
    pub fn new(deps: FillDeps, notification_ttl: Duration, idle_ttl: Duration) -> Self {
        Self {
            deps,
            notification_ttl,
            idle_ttl: chrono::Duration::from_std(idle_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(24)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a page and gives it its own orchestrator (and single-flight guard).
    pub fn open(&self, user_id: &str, html: &str) -> Arc<FillSession> {
        let now = Utc::now();
        self.sweep_at(now);

        let id = Uuid::new_v4();
        let document = Arc::new(RwLock::new(Document::parse(html)));
        let notifications = Arc::new(NotificationLog::new(self.notification_ttl));
        let orchestrator = FillOrchestrator::new(
            user_id.to_string(),
            document.clone(),
            notifications.clone(),
            self.deps.clone(),
        );

        let session = Arc::new(FillSession {
            id,
            user_id: user_id.to_string(),
            created_at: now,
            document,
            notifications,
            orchestrator,
            last_seen: Mutex::new(now),
        });
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session.clone());
        info!(session_id = %id, user_id, "fill session opened");
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<FillSession>> {
        let now = Utc::now();
        self.sweep_at(now);

        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()?;
        session.touch(now);
        Some(session)
    }

    pub fn close(&self, id: Uuid) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            info!(session_id = %id, "fill session closed");
        }
        removed
    }

    /// Drops idle sessions as of `now`. A session with a run in flight is kept.
    fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| {
            session.orchestrator.state() == FillState::Running
                || session.idle_since() + self.idle_ttl > now
        });
        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, remaining = sessions.len(), "idle fill sessions expired");
        }
        expired
    }
}
