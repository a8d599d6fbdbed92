//! Structured trip data.

use serde::Serialize;

/// Snapshot of one trip offer, derived from a node's text.
///
/// Unset fields mean the pattern was absent, which is distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripDescriptor {
    pub distance_km: Option<f64>,
    pub suggested_price: Option<u32>,
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub has_multiple_stops: bool,
    pub is_new_client: bool,
    /// Passenger rating on a 0-5 scale. Unset is neutral.
    pub passenger_rating: Option<f64>,
}

impl TripDescriptor {
    /// True when nothing could be extracted.
    pub fn is_empty(&self) -> bool {
        self.distance_km.is_none()
            && self.suggested_price.is_none()
            && self.pickup.is_none()
            && self.destination.is_none()
            && self.passenger_rating.is_none()
    }

    /// One-line summary for logs and notifications.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(distance) = self.distance_km {
            parts.push(format!("{distance:.1} km"));
        }
        if let Some(price) = self.suggested_price {
            parts.push(format!("${price}"));
        }
        match (&self.pickup, &self.destination) {
            (Some(from), Some(to)) => parts.push(format!("{from} → {to}")),
            (None, Some(to)) => parts.push(format!("to {to}")),
            (Some(from), None) => parts.push(format!("from {from}")),
            (None, None) => {}
        }
        if self.has_multiple_stops {
            parts.push("multiple stops".to_string());
        }
        if parts.is_empty() {
            "no details".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let trip = TripDescriptor::default();
        assert!(trip.is_empty());
        assert_eq!(trip.summary(), "no details");
    }

    #[test]
    fn test_summary() {
        let trip = TripDescriptor {
            distance_km: Some(5.2),
            suggested_price: Some(220),
            pickup: Some("Centro".to_string()),
            destination: Some("Polanco".to_string()),
            ..Default::default()
        };
        assert!(!trip.is_empty());
        assert_eq!(trip.summary(), "5.2 km, $220, Centro → Polanco");
    }

    #[test]
    fn test_serializes_unset_as_null() {
        let json = serde_json::to_value(TripDescriptor::default()).unwrap();
        assert!(json["distance_km"].is_null());
        assert_eq!(json["has_multiple_stops"], false);
    }
}
