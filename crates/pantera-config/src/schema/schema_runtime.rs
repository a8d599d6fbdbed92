//! Action timing and supervision settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::default_true;

/// Action sequencer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Submit counter-offers automatically. When false the engine only
    /// notifies about accepted trips.
    #[serde(default = "default_true")]
    pub autobid_enabled: bool,

    /// Wait after a click before reading the re-rendered tree (milliseconds).
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Pause before the single retry of a null root fetch (milliseconds).
    #[serde(default = "default_root_retry_delay")]
    pub root_retry_delay_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            autobid_enabled: default_true(),
            settle_delay_ms: default_settle_delay(),
            root_retry_delay_ms: default_root_retry_delay(),
        }
    }
}

impl ActionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn root_retry_delay(&self) -> Duration {
        Duration::from_millis(self.root_retry_delay_ms)
    }
}

fn default_settle_delay() -> u64 {
    500
}

fn default_root_retry_delay() -> u64 {
    50
}

/// Supervisor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Liveness loop polling interval (seconds).
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,

    /// Forward engine outcomes to the user as notifications.
    #[serde(default = "default_true")]
    pub notify_outcomes: bool,

    /// Whether to restart the engine after it fails.
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Maximum restarts inside `restart_window_secs` before giving up.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    #[serde(default = "default_restart_window")]
    pub restart_window_secs: u64,

    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,

    /// Capacity of the notification queue; overflow is dropped.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Log directory (supports `~`).
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            liveness_interval_secs: default_liveness_interval(),
            notify_outcomes: default_true(),
            auto_restart: default_true(),
            max_restarts: default_max_restarts(),
            restart_window_secs: default_restart_window(),
            restart_delay_ms: default_restart_delay(),
            notification_capacity: default_notification_capacity(),
            log_dir: None,
        }
    }
}

impl SupervisorConfig {
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }

    pub fn restart_window(&self) -> Duration {
        Duration::from_secs(self.restart_window_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

fn default_liveness_interval() -> u64 {
    5
}

fn default_max_restarts() -> u32 {
    5
}

fn default_restart_window() -> u64 {
    300
}

fn default_restart_delay() -> u64 {
    1000
}

fn default_notification_capacity() -> usize {
    64
}
