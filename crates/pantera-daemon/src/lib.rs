//! # Pantera Daemon
//!
//! Supervision for the event-driven engine:
//!
//! - [`Supervisor`] owns the run-flag, start/stop notifications and the
//!   restart-on-failure policy
//! - [`LivenessMonitor`] runs the periodic liveness loop, cancelled through
//!   the run-flag
//! - [`ChannelNotifier`] / [`NotificationPump`] deliver notifications
//!   without ever blocking the engine

pub mod error;
pub mod liveness;
pub mod notifications;
pub mod restart;
pub mod supervisor;

pub use error::{SupervisorError, SupervisorState};
pub use liveness::{
    ComponentCheck, HealthStatus, LivenessMonitor, LivenessProbe, LivenessReport, ProcessAlive,
};
pub use notifications::{ChannelNotifier, NotificationPump, NotificationSink, TracingSink};
pub use restart::RestartTracker;
pub use supervisor::{Supervisor, SupervisorStatus};
