//! Outbound user notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine events (trip detected, bid submitted, start/stop).
    Info,
    /// Non-fatal failures surfaced for awareness (bid sequence failed).
    Low,
    /// Conditions that need the user's attention.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Severity::Info)
    }

    pub fn low(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Severity::Low)
    }
}

/// Fire-and-forget notification delivery.
///
/// Implementations must never block the caller on delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!(
                title = %notification.title,
                "Notification: {}",
                notification.body
            ),
            Severity::Low | Severity::High => warn!(
                title = %notification.title,
                severity = %notification.severity,
                "Notification: {}",
                notification.body
            ),
        }
    }
}
