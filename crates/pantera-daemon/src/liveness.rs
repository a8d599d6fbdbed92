//! Periodic liveness checking.
//!
//! The loop runs beside the event-driven engine and shares nothing with it
//! except the [`RunFlag`]; clearing the flag wakes the loop out of its sleep.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pantera_protocols::RunFlag;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Health status of a component or of the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Functioning, but not in the expected state.
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of probing one component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

impl ComponentCheck {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Aggregate of one liveness round.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessReport {
    /// Worst status among the component checks.
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub checks: Vec<ComponentCheck>,
}

impl LivenessReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            timestamp: chrono::Utc::now(),
            checks: Vec::new(),
        }
    }

    /// Add a component check.
    pub fn with_check(mut self, check: ComponentCheck) -> Self {
        // Update overall status based on worst component
        if check.status == HealthStatus::Unhealthy {
            self.status = HealthStatus::Unhealthy;
        } else if check.status == HealthStatus::Degraded
            && self.status != HealthStatus::Unhealthy
        {
            self.status = HealthStatus::Degraded;
        }
        self.checks.push(check);
        self
    }
}

/// Something the liveness loop can probe.
/// Uses boxed futures for dyn compatibility.
pub trait LivenessProbe: Send + Sync {
    fn name(&self) -> &str;

    fn probe(&self) -> Pin<Box<dyn Future<Output = ComponentCheck> + Send + '_>>;
}

/// Runs liveness probes on a fixed interval.
pub struct LivenessMonitor {
    interval: Duration,
    probes: RwLock<Vec<Arc<dyn LivenessProbe>>>,
    last_report: RwLock<Option<LivenessReport>>,
    check_count: AtomicU64,
    failure_count: AtomicU64,
}

impl LivenessMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            probes: RwLock::new(Vec::new()),
            last_report: RwLock::new(None),
            check_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    /// Create a monitor with an initial set of probes.
    pub fn with_probes(interval: Duration, probes: Vec<Arc<dyn LivenessProbe>>) -> Self {
        Self {
            probes: RwLock::new(probes),
            ..Self::new(interval)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn register(&self, probe: Arc<dyn LivenessProbe>) {
        let mut probes = self.probes.write().await;
        info!("Registered liveness probe: {}", probe.name());
        probes.push(probe);
    }

    /// Run every registered probe once.
    pub async fn check(&self) -> LivenessReport {
        let start = Instant::now();
        self.check_count.fetch_add(1, Ordering::SeqCst);

        let probes = self.probes.read().await;
        let mut report = LivenessReport::healthy();
        for probe in probes.iter() {
            let check = probe.probe().await;
            debug!("Liveness probe {}: {}", check.name, check.status);
            report = report.with_check(check);
        }

        debug!(
            "Liveness check completed in {:?}: {}",
            start.elapsed(),
            report.status
        );

        if report.status == HealthStatus::Unhealthy {
            self.failure_count.fetch_add(1, Ordering::SeqCst);
            let failing: Vec<&str> = report
                .checks
                .iter()
                .filter(|c| c.status == HealthStatus::Unhealthy)
                .map(|c| c.name.as_str())
                .collect();
            warn!(?failing, "Liveness check failed");
        }

        *self.last_report.write().await = Some(report.clone());
        report
    }

    pub async fn last_report(&self) -> Option<LivenessReport> {
        self.last_report.read().await.clone()
    }

    pub fn check_count(&self) -> u64 {
        self.check_count.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::SeqCst)
    }

    /// Probe every `interval` until `flag` is cleared.
    ///
    /// A clear flag wakes the loop immediately; it never waits out the rest
    /// of the interval.
    pub async fn start_loop(self: Arc<Self>, flag: RunFlag) {
        info!("Starting liveness loop (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if !flag.is_running() {
                        break;
                    }
                    let report = self.check().await;
                    if report.status == HealthStatus::Unhealthy {
                        error!("Liveness check reported unhealthy");
                    }
                }
                _ = flag.stopped() => {
                    break;
                }
            }
        }

        info!("Liveness loop shutting down");
    }
}

/// Always healthy while the process can run the loop at all.
pub struct ProcessAlive;

impl LivenessProbe for ProcessAlive {
    fn name(&self) -> &str {
        "process"
    }

    fn probe(&self) -> Pin<Box<dyn Future<Output = ComponentCheck> + Send + '_>> {
        Box::pin(async {
            ComponentCheck::new("process", HealthStatus::Healthy).with_details("Process is alive")
        })
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
