//! Non-blocking notification delivery.
//!
//! The engine calls [`ChannelNotifier::notify`] from its event callback; the
//! notification is queued with `try_send` and delivered by a
//! [`NotificationPump`] on the async side. A full queue drops the
//! notification instead of stalling the engine.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pantera_protocols::{Notification, Notifier, TracingNotifier};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::liveness::{ComponentCheck, HealthStatus, LivenessProbe};

/// Final destination of notifications.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification) {
        TracingNotifier.notify(notification.clone());
    }
}

/// [`Notifier`] backed by a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
    dropped: Arc<AtomicU64>,
}

impl ChannelNotifier {
    /// Create a notifier and the pump that drains it.
    pub fn channel(capacity: usize) -> (Self, NotificationPump) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let notifier = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (notifier, NotificationPump { rx })
    }

    /// Notifications discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                self.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(title = %n.title, "Notification queue full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                self.dropped.fetch_add(1, Ordering::SeqCst);
                debug!(title = %n.title, "Notification pump gone, dropping");
            }
        }
    }
}

/// Queue health: unhealthy once the pump is gone, degraded after any drop.
impl LivenessProbe for ChannelNotifier {
    fn name(&self) -> &str {
        "notifications"
    }

    fn probe(&self) -> Pin<Box<dyn Future<Output = ComponentCheck> + Send + '_>> {
        Box::pin(async {
            let dropped = self.dropped();
            if self.tx.is_closed() {
                ComponentCheck::new("notifications", HealthStatus::Unhealthy)
                    .with_details("notification pump stopped")
            } else if dropped > 0 {
                ComponentCheck::new("notifications", HealthStatus::Degraded)
                    .with_details(format!("{dropped} notification(s) dropped"))
            } else {
                ComponentCheck::new("notifications", HealthStatus::Healthy)
            }
        })
    }
}

/// Receiving half of a [`ChannelNotifier`].
#[derive(Debug)]
pub struct NotificationPump {
    rx: mpsc::Receiver<Notification>,
}

impl NotificationPump {
    /// Deliver notifications until every sender is dropped. Returns the
    /// number delivered.
    pub async fn run(mut self, sink: Arc<dyn NotificationSink>) -> u64 {
        let mut delivered = 0u64;
        while let Some(notification) = self.rx.recv().await {
            sink.deliver(&notification);
            delivered += 1;
        }
        info!(delivered, "Notification pump finished");
        delivered
    }
}
