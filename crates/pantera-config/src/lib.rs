//! # Pantera Config
//!
//! Configuration for the trip-offer engine: target application, text
//! markers, pricing and filter policies, action timing and supervision.
//! Loaded once per run and validated before the engine may start.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
