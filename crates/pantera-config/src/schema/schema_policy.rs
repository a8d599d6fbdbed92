//! Pricing and trip filter policies.

use serde::{Deserialize, Serialize};

/// Bid pricing policy.
///
/// `min_bid <= max_bid` is a startup invariant enforced by the validator;
/// every computed bid is clamped into `[min_bid, max_bid]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Currency units per kilometre.
    #[serde(default = "default_price_per_km")]
    pub price_per_km: f64,

    #[serde(default = "default_min_bid")]
    pub min_bid: u32,

    #[serde(default = "default_max_bid")]
    pub max_bid: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            price_per_km: default_price_per_km(),
            min_bid: default_min_bid(),
            max_bid: default_max_bid(),
        }
    }
}

fn default_price_per_km() -> f64 {
    40.0
}

fn default_min_bid() -> u32 {
    100
}

fn default_max_bid() -> u32 {
    600
}

/// Trip acceptance policy. Unset bounds do not constrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(default)]
    pub min_distance_km: Option<f64>,

    #[serde(default = "default_max_distance")]
    pub max_distance_km: Option<f64>,

    #[serde(default)]
    pub min_price: Option<u32>,

    #[serde(default)]
    pub max_price: Option<u32>,

    #[serde(default)]
    pub reject_multiple_stops: bool,

    #[serde(default)]
    pub reject_new_clients: bool,

    #[serde(default)]
    pub reject_low_rating: bool,

    /// Lowest acceptable passenger rating when `reject_low_rating` is set.
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            min_distance_km: None,
            max_distance_km: default_max_distance(),
            min_price: None,
            max_price: None,
            reject_multiple_stops: false,
            reject_new_clients: false,
            reject_low_rating: false,
            min_rating: default_min_rating(),
        }
    }
}

impl FilterPolicy {
    /// Policy that accepts every trip.
    pub fn permissive() -> Self {
        Self {
            max_distance_km: None,
            ..Self::default()
        }
    }
}

fn default_max_distance() -> Option<f64> {
    Some(10.0)
}

fn default_min_rating() -> f64 {
    4.0
}
