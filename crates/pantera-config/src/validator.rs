//! Configuration validation.
//!
//! Errors make a configuration unusable and stop the engine from starting.
//! Warnings are reported but do not block.

use crate::error::ConfigError;
use crate::schema::{Config, FilterPolicy, MarkerConfig, PricingPolicy};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert into `Err(ConfigError::Rejected)` when any error was found,
    /// otherwise hand back the warnings.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ConfigError::Rejected(
                self.errors.iter().map(ToString::to_string).collect(),
            ))
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

const MAX_SETTLE_DELAY_MS: u64 = 5_000;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_target(config, &mut result);
        Self::validate_markers(&config.markers, &mut result);
        Self::validate_pricing(&config.pricing, &mut result);
        Self::validate_filters(&config.filters, &mut result);
        Self::validate_runtime(config, &mut result);

        Ok(result)
    }

    fn validate_target(config: &Config, result: &mut ValidationResult) {
        if config.target.package.trim().is_empty() {
            result.add_error(ValidationError::new(
                "target.package",
                "Target package cannot be empty",
            ));
        }
    }

    fn validate_markers(markers: &MarkerConfig, result: &mut ValidationResult) {
        if is_blank(&markers.trip) {
            result.add_error(ValidationError::new(
                "markers.trip",
                "At least one trip marker is required",
            ));
        }
        if is_blank(&markers.confirm) {
            result.add_error(ValidationError::new(
                "markers.confirm",
                "At least one confirm marker is required",
            ));
        }

        let lists = [
            ("markers.trip", &markers.trip),
            ("markers.confirm", &markers.confirm),
            ("markers.multiple_stops", &markers.multiple_stops),
            ("markers.new_client", &markers.new_client),
            ("markers.input_classes", &markers.input_classes),
        ];
        for (path, list) in lists {
            if list.iter().any(|m| m.trim().is_empty()) {
                result.add_warning(ValidationWarning::new(
                    path,
                    "Empty marker entries are ignored",
                ));
            }
        }
    }

    fn validate_pricing(pricing: &PricingPolicy, result: &mut ValidationResult) {
        if !pricing.price_per_km.is_finite() || pricing.price_per_km < 0.0 {
            result.add_error(ValidationError::new(
                "pricing.price_per_km",
                "price_per_km must be a finite, non-negative number",
            ));
        }

        if pricing.min_bid > pricing.max_bid {
            result.add_error(ValidationError::new(
                "pricing.min_bid",
                format!(
                    "min_bid ({}) must not exceed max_bid ({})",
                    pricing.min_bid, pricing.max_bid
                ),
            ));
        }
    }

    fn validate_filters(filters: &FilterPolicy, result: &mut ValidationResult) {
        let bounds = [
            ("filters.min_distance_km", filters.min_distance_km),
            ("filters.max_distance_km", filters.max_distance_km),
        ];
        for (path, bound) in bounds {
            if let Some(km) = bound {
                if !km.is_finite() || km < 0.0 {
                    result.add_error(ValidationError::new(
                        path,
                        format!("{km} is not a finite, non-negative distance"),
                    ));
                }
            }
        }

        if let (Some(min), Some(max)) = (filters.min_distance_km, filters.max_distance_km) {
            if min > max {
                result.add_error(ValidationError::new(
                    "filters.min_distance_km",
                    format!("min_distance_km ({min}) must not exceed max_distance_km ({max})"),
                ));
            }
        }

        if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
            if min > max {
                result.add_error(ValidationError::new(
                    "filters.min_price",
                    format!("min_price ({min}) must not exceed max_price ({max})"),
                ));
            }
        }

        if !(0.0..=5.0).contains(&filters.min_rating) {
            result.add_error(ValidationError::new(
                "filters.min_rating",
                "min_rating must be between 0 and 5",
            ));
        }
    }

    fn validate_runtime(config: &Config, result: &mut ValidationResult) {
        if config.action.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            result.add_warning(ValidationWarning::new(
                "action.settle_delay_ms",
                "settle_delay_ms is above 5 seconds, offers may expire before the bid is entered",
            ));
        }

        if config.action.autobid_enabled && config.pricing.price_per_km == 0.0 {
            result.add_warning(ValidationWarning::new(
                "pricing.price_per_km",
                "price_per_km is 0, every bid will be min_bid",
            ));
        }

        if config.supervisor.liveness_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "supervisor.liveness_interval_secs",
                "liveness_interval_secs must be greater than 0",
            ));
        }

        if config.supervisor.restart_window_secs == 0 {
            result.add_error(ValidationError::new(
                "supervisor.restart_window_secs",
                "restart_window_secs must be greater than 0",
            ));
        }

        if config.supervisor.notification_capacity == 0 {
            result.add_error(ValidationError::new(
                "supervisor.notification_capacity",
                "notification_capacity must be greater than 0",
            ));
        }
    }
}

/// True when no entry survives trimming.
fn is_blank(list: &[String]) -> bool {
    list.iter().all(|m| m.trim().is_empty())
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
