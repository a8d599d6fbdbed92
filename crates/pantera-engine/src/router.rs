//! Inbound host event routing.

use std::sync::atomic::{AtomicU64, Ordering};

use pantera_protocols::{EventKind, HostEvent};
use serde::Serialize;
use tracing::{debug, trace};

/// What to do with an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Run one scan pass over the tree.
    Scan,
    /// Record for diagnostics only; no tree access.
    Observe,
    /// Foreign or anonymous source; no tree access.
    Drop,
}

/// Counters since the router was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub scans: u64,
    pub observed: u64,
    pub dropped: u64,
}

/// Filters events to the target package and decides whether to scan.
#[derive(Debug)]
pub struct EventRouter {
    target_package: String,
    scans: AtomicU64,
    observed: AtomicU64,
    dropped: AtomicU64,
}

impl EventRouter {
    pub fn new(target_package: impl Into<String>) -> Self {
        Self {
            target_package: target_package.into(),
            scans: AtomicU64::new(0),
            observed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn target_package(&self) -> &str {
        &self.target_package
    }

    /// Route `event`. The package check comes first; the event kind is only
    /// considered for the target application's events.
    pub fn route(&self, event: &HostEvent) -> Route {
        if !event.is_from(&self.target_package) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(
                source = event.source_package.as_deref().unwrap_or("<none>"),
                "Dropping event from foreign package"
            );
            return Route::Drop;
        }

        match event.kind {
            EventKind::ContentChanged | EventKind::StateChanged => {
                self.scans.fetch_add(1, Ordering::Relaxed);
                Route::Scan
            }
            EventKind::ViewClicked => {
                self.observed.fetch_add(1, Ordering::Relaxed);
                debug!(detail = event.detail.as_deref().unwrap_or(""), "Observed {}", event.kind);
                Route::Observe
            }
        }
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            scans: self.scans.load(Ordering::Relaxed),
            observed: self.observed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "sinet.startup.inDriver";

    #[test]
    fn test_target_content_and_state_changes_scan() {
        let router = EventRouter::new(TARGET);
        assert_eq!(
            router.route(&HostEvent::new(TARGET, EventKind::ContentChanged)),
            Route::Scan
        );
        assert_eq!(
            router.route(&HostEvent::new(TARGET, EventKind::StateChanged)),
            Route::Scan
        );
        assert_eq!(router.stats().scans, 2);
    }

    #[test]
    fn test_click_events_are_observed_only() {
        let router = EventRouter::new(TARGET);
        let event = HostEvent::new(TARGET, EventKind::ViewClicked).with_detail("button");
        assert_eq!(router.route(&event), Route::Observe);
        assert_eq!(router.stats().observed, 1);
    }

    #[test]
    fn test_foreign_package_dropped_for_every_kind() {
        let router = EventRouter::new(TARGET);
        for kind in [
            EventKind::ContentChanged,
            EventKind::StateChanged,
            EventKind::ViewClicked,
        ] {
            assert_eq!(
                router.route(&HostEvent::new("com.android.systemui", kind)),
                Route::Drop
            );
        }
        assert_eq!(
            router.stats(),
            RouterStats {
                scans: 0,
                observed: 0,
                dropped: 3
            }
        );
    }

    #[test]
    fn test_anonymous_event_dropped() {
        let router = EventRouter::new(TARGET);
        assert_eq!(
            router.route(&HostEvent::anonymous(EventKind::ContentChanged)),
            Route::Drop
        );
    }

    #[test]
    fn test_package_match_is_exact() {
        let router = EventRouter::new(TARGET);
        let event = HostEvent::new("sinet.startup.inDriver.debug", EventKind::ContentChanged);
        assert_eq!(router.route(&event), Route::Drop);
    }
}
