//! Engine supervision.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use pantera_config::SupervisorConfig;
use pantera_protocols::{Notification, Notifier, RunFlag, Severity};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::{SupervisorError, SupervisorState};
use crate::liveness::{LivenessMonitor, LivenessProbe, LivenessReport, ProcessAlive};
use crate::restart::RestartTracker;

/// Snapshot of supervisor health.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    pub state: SupervisorState,
    /// Whether the run-flag is set.
    pub running: bool,
    pub liveness_checks: u64,
    pub liveness_failures: u64,
    /// Restarts inside the current window.
    pub restarts: u32,
    /// Most recent liveness round, if one has run.
    pub last_liveness: Option<LivenessReport>,
}

/// Owns the run-flag and the engine's lifetime.
///
/// The engine only ever sees a clone of the [`RunFlag`]; everything else
/// (liveness loop, restart policy, start/stop notifications) lives here.
pub struct Supervisor {
    config: SupervisorConfig,
    state: AtomicU8,
    run_flag: RunFlag,
    liveness: Arc<LivenessMonitor>,
    restart_tracker: RwLock<RestartTracker>,
    notifier: Arc<dyn Notifier>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SupervisorError> {
        if config.liveness_interval_secs == 0 {
            return Err(SupervisorError::Config(
                "liveness_interval_secs must be positive".to_string(),
            ));
        }
        if config.restart_window_secs == 0 {
            return Err(SupervisorError::Config(
                "restart_window_secs must be positive".to_string(),
            ));
        }

        let run_flag = RunFlag::new();
        let liveness = Arc::new(LivenessMonitor::with_probes(
            config.liveness_interval(),
            vec![Arc::new(ProcessAlive)],
        ));
        let restart_tracker = RestartTracker::new(config.max_restarts, config.restart_window());

        Ok(Self {
            config,
            state: AtomicU8::new(SupervisorState::Stopped as u8),
            run_flag,
            liveness,
            restart_tracker: RwLock::new(restart_tracker),
            notifier,
        })
    }

    pub fn state(&self) -> SupervisorState {
        SupervisorState::from(self.state.load(Ordering::SeqCst))
    }

    /// Handle to the run-flag shared with the engine.
    pub fn run_flag(&self) -> RunFlag {
        self.run_flag.clone()
    }

    pub fn liveness(&self) -> &Arc<LivenessMonitor> {
        &self.liveness
    }

    /// Add a probe to the liveness loop.
    pub async fn register_probe(&self, probe: Arc<dyn LivenessProbe>) {
        self.liveness.register(probe).await;
    }

    /// Set the run-flag and announce the start.
    pub fn start(&self) -> Result<(), SupervisorError> {
        self.transition(&[SupervisorState::Stopped], SupervisorState::Starting)?;
        info!("Supervisor starting...");

        self.run_flag.start();
        self.set_state(SupervisorState::Running);
        self.notifier
            .notify(Notification::info("Bot started", "Watching for trip offers"));
        info!("Supervisor started");
        Ok(())
    }

    /// Clear the run-flag and announce the stop.
    pub fn stop(&self) -> Result<(), SupervisorError> {
        self.transition(
            &[SupervisorState::Running, SupervisorState::Restarting],
            SupervisorState::ShuttingDown,
        )?;
        info!("Supervisor shutting down...");

        self.run_flag.stop();
        self.notifier
            .notify(Notification::info("Bot stopped", "No longer watching for trips"));
        self.set_state(SupervisorState::Stopped);
        info!("Supervisor stopped");
        Ok(())
    }

    /// Ask a running [`Supervisor::run`] to wind down.
    ///
    /// Only clears the run-flag; `run` observes it, stops the engine task
    /// and performs the regular [`Supervisor::stop`].
    pub fn request_stop(&self) {
        if self.run_flag.stop() {
            info!("Stop requested");
        }
    }

    /// Start, run `main_fn` until it finishes or the run-flag is cleared,
    /// restarting it after errors within the configured limits, then stop.
    pub async fn run<F, Fut>(&self, main_fn: F) -> Result<(), SupervisorError>
    where
        F: Fn(RunFlag) -> Fut,
        Fut: Future<Output = Result<(), SupervisorError>> + Send,
    {
        self.start()?;

        let liveness_task = tokio::spawn(self.liveness.clone().start_loop(self.run_flag.clone()));

        let outcome = loop {
            tokio::select! {
                result = main_fn(self.run_flag.clone()) => {
                    match result {
                        Ok(()) => {
                            info!("Engine finished normally");
                            break Ok(());
                        }
                        Err(e) => {
                            error!("Engine error: {}", e);
                            if !self.config.auto_restart {
                                break Err(e);
                            }
                            if let Err(limit) = self.should_restart().await {
                                self.notifier.notify(Notification::new(
                                    "Bot halted",
                                    limit.to_string(),
                                    Severity::High,
                                ));
                                break Err(limit);
                            }

                            self.set_state(SupervisorState::Restarting);
                            self.notifier
                                .notify(Notification::low("Bot restarting", e.to_string()));
                            warn!("Restarting engine after error...");
                            tokio::select! {
                                _ = tokio::time::sleep(self.config.restart_delay()) => {}
                                _ = self.run_flag.stopped() => {
                                    break Ok(());
                                }
                            }
                            self.set_state(SupervisorState::Running);
                        }
                    }
                }
                _ = self.run_flag.stopped() => {
                    info!("Run flag cleared, stopping engine");
                    break Ok(());
                }
            }
        };

        self.stop()?;
        if let Err(e) = liveness_task.await {
            warn!("Liveness loop ended abnormally: {}", e);
        }
        outcome
    }

    pub async fn status(&self) -> SupervisorStatus {
        SupervisorStatus {
            state: self.state(),
            running: self.run_flag.is_running(),
            liveness_checks: self.liveness.check_count(),
            liveness_failures: self.liveness.failure_count(),
            restarts: self.restart_tracker.read().await.count(),
            last_liveness: self.liveness.last_report().await,
        }
    }

    async fn should_restart(&self) -> Result<(), SupervisorError> {
        let mut tracker = self.restart_tracker.write().await;
        if tracker.record_restart() {
            error!(
                "Maximum restarts ({}) exceeded in {:?}",
                tracker.max_restarts(),
                self.config.restart_window()
            );
            return Err(SupervisorError::MaxRestartsExceeded {
                max: tracker.max_restarts(),
            });
        }

        info!(
            "Restart {}/{} in current window",
            tracker.count(),
            tracker.max_restarts()
        );
        Ok(())
    }

    fn transition(
        &self,
        allowed: &[SupervisorState],
        to: SupervisorState,
    ) -> Result<(), SupervisorError> {
        let current = self.state();
        if !allowed.contains(&current) {
            return Err(SupervisorError::InvalidStateTransition { from: current, to });
        }
        self.set_state(to);
        Ok(())
    }

    fn set_state(&self, state: SupervisorState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("running", &self.run_flag.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
