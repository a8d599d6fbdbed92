//! Inbound UI-change notifications from the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of UI change reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Window content changed (new views, updated text).
    ContentChanged,
    /// Window state changed (new screen, dialog opened).
    StateChanged,
    /// A view was clicked.
    ViewClicked,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::ContentChanged => write!(f, "content_changed"),
            EventKind::StateChanged => write!(f, "state_changed"),
            EventKind::ViewClicked => write!(f, "view_clicked"),
        }
    }
}

/// A UI-change notification.
///
/// Node references are deliberately not carried: handles are only valid
/// inside the step that fetched them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    /// Package identifier of the application the event originated from.
    /// Hosts may report no package at all.
    #[serde(default)]
    pub source_package: Option<String>,

    pub kind: EventKind,

    /// Text of the changed node, for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl HostEvent {
    pub fn new(source_package: impl Into<String>, kind: EventKind) -> Self {
        Self {
            source_package: Some(source_package.into()),
            kind,
            detail: None,
            received_at: Utc::now(),
        }
    }

    /// Event without a source package.
    pub fn anonymous(kind: EventKind) -> Self {
        Self {
            source_package: None,
            kind,
            detail: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Whether the event originated from `package`.
    pub fn is_from(&self, package: &str) -> bool {
        self.source_package.as_deref() == Some(package)
    }
}
