//! User-facing toast notifications and the internal error log.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::ApiError;

const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// Toast shown to the user: a title plus a remediation hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
        }
    }
}

/// Sink for toasts and error records; injected into the stores that report to users.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    /// Record an internal error and return its identifier.
    fn record_error(&self, message: &str, context: &str, severity: Severity) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    pub message: String,
    pub context: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Newest-first error history capped at a fixed number of entries.
#[derive(Debug)]
pub struct ErrorLog {
    records: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
}

static ERROR_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl ErrorLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, message: &str, context: &str, severity: Severity) -> String {
        let timestamp = Utc::now();
        let sequence = ERROR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let id = format!("error_{}_{sequence:04}", timestamp.timestamp_millis());

        match severity {
            Severity::High | Severity::Critical => {
                tracing::error!(error_id = %id, ?severity, context, detail = message, "error recorded")
            }
            Severity::Low | Severity::Medium => {
                tracing::warn!(error_id = %id, ?severity, context, detail = message, "error recorded")
            }
        }

        let record = ErrorRecord {
            id: id.clone(),
            message: message.to_string(),
            context: context.to_string(),
            severity,
            timestamp,
        };

        let mut guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push_front(record);
        guard.truncate(self.capacity);
        id
    }

    pub fn recent(&self, limit: usize) -> Vec<ErrorRecord> {
        let guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// In-process notifier that keeps every toast and error for later display.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Mutex<Vec<Notification>>,
    errors: ErrorLog,
}

impl NotificationCenter {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remove and return everything shown so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, variant = ?notification.variant, "notification");
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }

    fn record_error(&self, message: &str, context: &str, severity: Severity) -> String {
        self.errors.record(message, context, severity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFriendlyError {
    pub title: String,
    pub message: String,
    pub action: String,
    pub can_retry: bool,
    pub error_id: String,
}

/// Log an API failure and translate it into wording a user can act on.
pub fn user_friendly(
    notifier: &dyn Notifier,
    error: &ApiError,
    endpoint: &str,
) -> UserFriendlyError {
    let context = format!("API call to {endpoint}");
    let error_id = notifier.record_error(&error.to_string(), &context, Severity::Medium);

    let (title, message, action) = match error {
        ApiError::Transport(_) | ApiError::Timeout(_) => (
            "Connection Problem",
            "Unable to connect to our servers. Please check your internet connection.",
            "Check connection",
        ),
        ApiError::Status { status, .. } if *status == 401 || *status == 403 => (
            "Authentication Error",
            "There was a problem with your login. Please try signing in again.",
            "Sign in again",
        ),
        ApiError::Decode(_) => (
            "Data Error",
            "We received unexpected data. Please try again.",
            "Try again",
        ),
        _ => (
            "Something went wrong",
            "We encountered an unexpected issue. Our team has been notified.",
            "Try again",
        ),
    };

    UserFriendlyError {
        title: title.to_string(),
        message: message.to_string(),
        action: action.to_string(),
        can_retry: true,
        error_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_log_keeps_newest_first_within_capacity() {
        let log = ErrorLog::with_capacity(2);
        log.record("first", "ctx", Severity::Low);
        log.record("second", "ctx", Severity::Medium);
        log.record("third", "ctx", Severity::High);

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "third");
        assert_eq!(recent[1].message, "second");
    }

    #[test]
    fn user_friendly_maps_network_errors() {
        let center = NotificationCenter::default();
        let friendly = user_friendly(
            &center,
            &ApiError::Transport("connection refused".to_string()),
            "/agencies",
        );

        assert_eq!(friendly.title, "Connection Problem");
        assert!(friendly.can_retry);
        let logged = center.errors().recent(1);
        assert_eq!(logged[0].id, friendly.error_id);
        assert_eq!(logged[0].context, "API call to /agencies");
    }

    #[test]
    fn user_friendly_maps_unauthorized_to_sign_in_hint() {
        let center = NotificationCenter::default();
        let friendly = user_friendly(
            &center,
            &ApiError::Status {
                status: 401,
                message: "expired".to_string(),
            },
            "/api/auth/check_session",
        );
        assert_eq!(friendly.action, "Sign in again");
    }

    #[test]
    fn drain_empties_the_center() {
        let center = NotificationCenter::default();
        center.notify(Notification::success("Signed In", "Welcome back!"));
        assert_eq!(center.drain().len(), 1);
        assert!(center.notifications().is_empty());
    }
}
