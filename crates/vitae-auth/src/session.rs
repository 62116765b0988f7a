//! Login sessions with sliding TTL.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

/// A logged-in session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Manages login sessions. Each successful lookup pushes the expiry forward.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionManager {
    /// TTLs beyond what chrono can represent saturate.
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Start a session for a user.
    pub fn create(&self, user_id: i64) -> Session {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: now,
            expires_at: self.expiry_from(now),
        };
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        debug!("Session created for user {}", user_id);
        session
    }

    /// Resolve a session to its user, extending its expiry.
    pub fn resolve(&self, id: &str) -> Option<i64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let expired = match sessions.get_mut(id) {
            Some(session) if session.expires_at > now => {
                session.expires_at = self.expiry_from(now);
                return Some(session.user_id);
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(id);
        }
        None
    }

    /// End a session.
    pub fn revoke(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Purged {} expired sessions", removed);
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let mgr = SessionManager::new(60);
        let session = mgr.create(7);
        assert_eq!(mgr.resolve(&session.id), Some(7));
        assert_eq!(mgr.resolve("missing"), None);
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn test_revoke() {
        let mgr = SessionManager::new(60);
        let session = mgr.create(1);
        assert!(mgr.revoke(&session.id));
        assert!(!mgr.revoke(&session.id));
        assert_eq!(mgr.resolve(&session.id), None);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let mgr = SessionManager::new(u64::MAX);
        let session = mgr.create(5);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert_eq!(mgr.resolve(&session.id), Some(5));

        let mgr = SessionManager::new(10_000_000_000_000);
        let session = mgr.create(6);
        assert!(session.expires_at > session.created_at);
        assert_eq!(mgr.resolve(&session.id), Some(6));
    }

    #[test]
    fn test_expired_session() {
        let mgr = SessionManager::new(0);
        let session = mgr.create(3);
        assert_eq!(mgr.resolve(&session.id), None);
        assert_eq!(mgr.count(), 0);

        mgr.create(4);
        assert_eq!(mgr.purge_expired(), 1);
    }
}
