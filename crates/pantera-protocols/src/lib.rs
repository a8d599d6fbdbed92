//! # Pantera Protocols
//!
//! Interfaces between the trip-offer engine and the host that owns the
//! observed application's UI.
//!
//! ## Core Traits
//!
//! - [`UiNode`] - One element of the externally owned UI tree
//! - [`UiTree`] - Access to the current root of that tree
//! - [`ScopedTree`] - Fetches roots as step-scoped [`NodeRef`] handles
//! - [`Notifier`] - Fire-and-forget user notifications
//!
//! The [`replay`] module provides an in-memory host used by the CLI and tests.

pub mod error;
pub mod event;
pub mod lifecycle;
pub mod node;
pub mod notify;
pub mod replay;

pub use error::NodeError;
pub use event::{EventKind, HostEvent};
pub use lifecycle::RunFlag;
pub use node::{NodeRef, ScopedTree, UiNode, UiTree};
pub use notify::{Notification, Notifier, Severity, TracingNotifier};
