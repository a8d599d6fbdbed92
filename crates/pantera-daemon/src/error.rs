//! Supervisor errors.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while supervising the engine.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Invalid supervisor state transition.
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SupervisorState,
        to: SupervisorState,
    },

    /// Maximum restart count exceeded.
    #[error("Maximum restart count ({max}) exceeded")]
    MaxRestartsExceeded { max: u32 },

    /// The supervised engine failed.
    #[error("Engine failed: {0}")]
    Engine(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SupervisorState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    ShuttingDown = 3,
    Restarting = 4,
}

impl From<u8> for SupervisorState {
    fn from(v: u8) -> Self {
        match v {
            1 => SupervisorState::Starting,
            2 => SupervisorState::Running,
            3 => SupervisorState::ShuttingDown,
            4 => SupervisorState::Restarting,
            _ => SupervisorState::Stopped,
        }
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Stopped => write!(f, "stopped"),
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::ShuttingDown => write!(f, "shutting_down"),
            SupervisorState::Restarting => write!(f, "restarting"),
        }
    }
}
