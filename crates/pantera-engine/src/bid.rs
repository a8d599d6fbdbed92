//! Bid computation.

use pantera_config::PricingPolicy;

/// Computes counter-offers from a [`PricingPolicy`].
///
/// `bid = round(distance_km * price_per_km)` clamped into
/// `[min_bid, max_bid]`. A trip with no extracted distance is bid at
/// `min_bid`.
#[derive(Debug, Clone)]
pub struct BidCalculator {
    policy: PricingPolicy,
}

impl BidCalculator {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn bid(&self, trip: &crate::TripDescriptor) -> u32 {
        self.bid_for_distance(trip.distance_km)
    }

    pub fn bid_for_distance(&self, distance_km: Option<f64>) -> u32 {
        let min = self.policy.min_bid;
        let max = self.policy.max_bid;
        let Some(distance) = distance_km else {
            return min;
        };
        let raw = (distance * self.policy.price_per_km).round();
        if raw.is_nan() {
            return min;
        }
        // Not f64::clamp, which panics when min > max.
        raw.max(f64::from(min)).min(f64::from(max)) as u32
    }
}
