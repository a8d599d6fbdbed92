//! Run-flag shared between the supervisor and the event-driven engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::debug;

/// Single boolean run-flag.
///
/// Written once per start/stop transition, read by everyone else. Waiters
/// blocked in [`RunFlag::stopped`] wake as soon as the flag is cleared.
#[derive(Debug, Clone)]
pub struct RunFlag {
    running: Arc<AtomicBool>,
    changed: Arc<Notify>,
}

impl RunFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Create a flag that is already set.
    pub fn running() -> Self {
        let flag = Self::new();
        flag.start();
        flag
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Set the flag. Returns `false` if it was already set.
    pub fn start(&self) -> bool {
        let was = self.running.swap(true, Ordering::SeqCst);
        if !was {
            debug!("Run flag set");
        }
        !was
    }

    /// Clear the flag and wake all waiters. Returns `false` if it was
    /// already clear.
    pub fn stop(&self) -> bool {
        let was = self.running.swap(false, Ordering::SeqCst);
        if was {
            debug!("Run flag cleared");
            self.changed.notify_waiters();
        }
        was
    }

    /// Resolve once the flag is clear.
    pub async fn stopped(&self) {
        loop {
            let notified = self.changed.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
