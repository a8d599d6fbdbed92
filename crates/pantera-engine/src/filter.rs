//! Trip acceptance policy.

use pantera_config::FilterPolicy;
use serde::Serialize;

use crate::trip::TripDescriptor;

/// Why a trip was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    DistanceBelowMin { distance_km: f64, min_km: f64 },
    DistanceAboveMax { distance_km: f64, max_km: f64 },
    PriceBelowMin { price: u32, min: u32 },
    PriceAboveMax { price: u32, max: u32 },
    MultipleStops,
    NewClient,
    LowRating { rating: f64, min: f64 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DistanceBelowMin { distance_km, min_km } => {
                write!(f, "distance {distance_km} km below minimum {min_km} km")
            }
            Self::DistanceAboveMax { distance_km, max_km } => {
                write!(f, "distance {distance_km} km above maximum {max_km} km")
            }
            Self::PriceBelowMin { price, min } => write!(f, "price {price} below minimum {min}"),
            Self::PriceAboveMax { price, max } => write!(f, "price {price} above maximum {max}"),
            Self::MultipleStops => write!(f, "trip has multiple stops"),
            Self::NewClient => write!(f, "passenger is a new client"),
            Self::LowRating { rating, min } => write!(f, "rating {rating} below minimum {min}"),
        }
    }
}

/// Filter verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Pure trip filter. Absent fields never cause a rejection, so a
/// descriptor with nothing extracted is accepted.
#[derive(Debug, Clone)]
pub struct DecisionFilter {
    policy: FilterPolicy,
}

impl DecisionFilter {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    pub fn accepts(&self, trip: &TripDescriptor) -> bool {
        self.evaluate(trip).is_accept()
    }

    /// Evaluate `trip`; the first failing rule is reported.
    pub fn evaluate(&self, trip: &TripDescriptor) -> Decision {
        match self.first_violation(trip) {
            Some(reason) => Decision::Reject(reason),
            None => Decision::Accept,
        }
    }

    fn first_violation(&self, trip: &TripDescriptor) -> Option<RejectReason> {
        let policy = &self.policy;

        if let Some(distance_km) = trip.distance_km {
            if let Some(min_km) = policy.min_distance_km.filter(|min| distance_km < *min) {
                return Some(RejectReason::DistanceBelowMin {
                    distance_km,
                    min_km,
                });
            }
            if let Some(max_km) = policy.max_distance_km.filter(|max| distance_km > *max) {
                return Some(RejectReason::DistanceAboveMax {
                    distance_km,
                    max_km,
                });
            }
        }

        if let Some(price) = trip.suggested_price {
            if let Some(min) = policy.min_price.filter(|min| price < *min) {
                return Some(RejectReason::PriceBelowMin { price, min });
            }
            if let Some(max) = policy.max_price.filter(|max| price > *max) {
                return Some(RejectReason::PriceAboveMax { price, max });
            }
        }

        if policy.reject_multiple_stops && trip.has_multiple_stops {
            return Some(RejectReason::MultipleStops);
        }
        if policy.reject_new_clients && trip.is_new_client {
            return Some(RejectReason::NewClient);
        }
        if policy.reject_low_rating {
            if let Some(rating) = trip.passenger_rating.filter(|r| *r < policy.min_rating) {
                return Some(RejectReason::LowRating {
                    rating,
                    min: policy.min_rating,
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(distance_km: Option<f64>, price: Option<u32>) -> TripDescriptor {
        TripDescriptor {
            distance_km,
            suggested_price: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_descriptor_accepted() {
        let filter = DecisionFilter::new(FilterPolicy::default());
        assert!(filter.accepts(&TripDescriptor::default()));
    }

    #[test]
    fn test_distance_bounds() {
        let filter = DecisionFilter::new(FilterPolicy {
            min_distance_km: Some(1.0),
            max_distance_km: Some(10.0),
            ..FilterPolicy::default()
        });
        assert!(filter.accepts(&trip(Some(5.2), None)));
        assert!(filter.accepts(&trip(Some(10.0), None)));
        assert_eq!(
            filter.evaluate(&trip(Some(0.5), None)),
            Decision::Reject(RejectReason::DistanceBelowMin {
                distance_km: 0.5,
                min_km: 1.0
            })
        );
        assert!(matches!(
            filter.evaluate(&trip(Some(12.0), None)),
            Decision::Reject(RejectReason::DistanceAboveMax { .. })
        ));
    }

    #[test]
    fn test_price_bounds() {
        let filter = DecisionFilter::new(FilterPolicy {
            min_price: Some(100),
            max_price: Some(500),
            ..FilterPolicy::permissive()
        });
        assert!(filter.accepts(&trip(None, Some(220))));
        assert!(!filter.accepts(&trip(None, Some(50))));
        assert!(!filter.accepts(&trip(None, Some(900))));
    }

    #[test]
    fn test_unset_fields_pass_bounds() {
        let filter = DecisionFilter::new(FilterPolicy {
            min_distance_km: Some(2.0),
            min_price: Some(100),
            ..FilterPolicy::default()
        });
        assert!(filter.accepts(&trip(None, None)));
    }

    #[test]
    fn test_flags() {
        let filter = DecisionFilter::new(FilterPolicy {
            reject_multiple_stops: true,
            reject_new_clients: true,
            ..FilterPolicy::permissive()
        });
        let mut t = trip(Some(3.0), Some(120));
        assert!(filter.accepts(&t));
        t.has_multiple_stops = true;
        assert_eq!(filter.evaluate(&t), Decision::Reject(RejectReason::MultipleStops));
        t.has_multiple_stops = false;
        t.is_new_client = true;
        assert_eq!(filter.evaluate(&t), Decision::Reject(RejectReason::NewClient));
    }

    #[test]
    fn test_flags_ignored_when_disabled() {
        let filter = DecisionFilter::new(FilterPolicy::permissive());
        let t = TripDescriptor {
            has_multiple_stops: true,
            is_new_client: true,
            passenger_rating: Some(1.0),
            ..Default::default()
        };
        assert!(filter.accepts(&t));
    }

    #[test]
    fn test_low_rating() {
        let filter = DecisionFilter::new(FilterPolicy {
            reject_low_rating: true,
            min_rating: 4.5,
            ..FilterPolicy::permissive()
        });
        let mut t = TripDescriptor::default();
        assert!(filter.accepts(&t));
        t.passenger_rating = Some(4.7);
        assert!(filter.accepts(&t));
        t.passenger_rating = Some(4.2);
        assert!(!filter.accepts(&t));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let filter = DecisionFilter::new(FilterPolicy::default());
        let t = trip(Some(11.0), Some(300));
        let first = filter.evaluate(&t);
        for _ in 0..3 {
            assert_eq!(filter.evaluate(&t), first);
        }
    }

    #[test]
    fn test_reject_reason_display() {
        let reason = RejectReason::PriceAboveMax { price: 900, max: 500 };
        assert_eq!(reason.to_string(), "price 900 above maximum 500");
    }
}
