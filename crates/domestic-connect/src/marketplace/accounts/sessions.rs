use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque bearer token issued at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    email: String,
    opened_at: DateTime<Utc>,
}

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Server-side session table mapping tokens to account emails.
///
/// Sessions expire `ttl` after they were opened; expired entries are dropped
/// on lookup and pruned whenever a new session opens.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionToken, SessionEntry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl SessionRegistry {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn open(&self, email: &str) -> SessionToken {
        self.open_at(email, Utc::now())
    }

    fn open_at(&self, email: &str, now: DateTime<Utc>) -> SessionToken {
        let token = SessionToken::generate();
        let entry = SessionEntry {
            email: email.to_string(),
            opened_at: now,
        };
        let mut guard = self.guard();
        let before = guard.len();
        guard.retain(|_, existing| !self.expired(existing, now));
        if guard.len() < before {
            tracing::debug!(pruned = before - guard.len(), "expired sessions pruned");
        }
        guard.insert(token.clone(), entry);
        token
    }

    /// Email bound to `token`, if the session is still open.
    pub fn lookup(&self, token: &SessionToken) -> Option<String> {
        self.lookup_at(token, Utc::now())
    }

    fn lookup_at(&self, token: &SessionToken, now: DateTime<Utc>) -> Option<String> {
        let mut guard = self.guard();
        let entry = guard.get(token)?;
        if self.expired(entry, now) {
            guard.remove(token);
            return None;
        }
        Some(entry.email.clone())
    }

    fn expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.opened_at >= self.ttl
    }

    pub fn opened_at(&self, token: &SessionToken) -> Option<DateTime<Utc>> {
        self.guard().get(token).map(|entry| entry.opened_at)
    }

    /// Returns `true` when a session was actually removed.
    pub fn close(&self, token: &SessionToken) -> bool {
        self.guard().remove(token).is_some()
    }

    pub fn active(&self) -> usize {
        self.guard().len()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<SessionToken, SessionEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_lookup_close_cycle() {
        let registry = SessionRegistry::default();
        let token = registry.open("wanjiku@example.com");

        assert_eq!(
            registry.lookup(&token).as_deref(),
            Some("wanjiku@example.com")
        );
        assert!(registry.opened_at(&token).is_some());
        assert!(registry.close(&token));
        assert!(!registry.close(&token));
        assert!(registry.lookup(&token).is_none());
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn expired_session_is_rejected_and_dropped() {
        let registry = SessionRegistry::with_ttl(Duration::hours(1));
        let opened = Utc::now() - Duration::hours(2);
        let token = registry.open_at("stale@example.com", opened);

        assert_eq!(
            registry.lookup_at(&token, opened + Duration::minutes(59)).as_deref(),
            Some("stale@example.com")
        );
        assert!(registry.lookup(&token).is_none());
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn opening_a_session_prunes_expired_entries() {
        let registry = SessionRegistry::with_ttl(Duration::minutes(30));
        let now = Utc::now();
        registry.open_at("old-1@example.com", now - Duration::hours(3));
        registry.open_at("old-2@example.com", now - Duration::hours(2));
        assert_eq!(registry.active(), 2);

        let fresh = registry.open("fresh@example.com");

        assert_eq!(registry.active(), 1);
        assert_eq!(registry.lookup(&fresh).as_deref(), Some("fresh@example.com"));
    }

    #[test]
    fn tokens_are_unique() {
        let registry = SessionRegistry::default();
        let first = registry.open("a@example.com");
        let second = registry.open("a@example.com");
        assert_ne!(first, second);
        assert_eq!(registry.active(), 2);
    }
}
