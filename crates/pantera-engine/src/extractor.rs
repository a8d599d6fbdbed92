//! Heuristic trip text extraction.
//!
//! Each field takes the first match in the text. A comma or dot followed by
//! exactly three digits (and a non-zero integer part) is a thousands
//! separator; otherwise it is the decimal point.

use once_cell::sync::Lazy;
use pantera_config::MarkerConfig;
use regex::Regex;

use crate::markers::MarkerSet;
use crate::trip::TripDescriptor;

static DISTANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+(?:[.,]\d+)?)\s*(kil[oó]metros?|kilomet(?:er|re)s?|kms?|metros|meters|metres|mts|m)\b",
    )
    .expect("valid distance pattern")
});

static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[$€£]|\b(?:usd|mxn|cop|ars|clp|pen)\b)\s*(\d+(?:[.,]\d+)*)|(\d+(?:[.,]\d+)*)\s*(?:[$€£]|(?:pesos?|usd|mxn|cop|ars|clp|pen)\b)",
    )
    .expect("valid price pattern")
});

static RATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d(?:[.,]\d{1,2})?)\s*[★⭐]|[★⭐]\s*(\d(?:[.,]\d{1,2})?)\b|\b(?:rating|calificaci[oó]n)\s*:?\s*(\d(?:[.,]\d{1,2})?)\b",
    )
    .expect("valid rating pattern")
});

static LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(desde|origen|recogida|pickup|hasta|destino|destination)\b\s*:?|(from|to)\s*:)\s*",
    )
    .expect("valid label pattern")
});

static ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\n,;|·→]+?)\s*(?:→|->)\s*([^\n,;|·→]+)").expect("valid arrow pattern")
});

const SEGMENT_BREAKS: [char; 5] = ['\n', '|', '·', ';', ','];

/// Parses trip offer text into a [`TripDescriptor`]. Never fails.
#[derive(Debug, Clone)]
pub struct TripExtractor {
    stop_markers: MarkerSet,
    new_client_markers: MarkerSet,
}

impl TripExtractor {
    pub fn new(stop_markers: MarkerSet, new_client_markers: MarkerSet) -> Self {
        Self {
            stop_markers,
            new_client_markers,
        }
    }

    pub fn from_config(markers: &MarkerConfig) -> Self {
        Self::new(
            MarkerSet::new(&markers.multiple_stops),
            MarkerSet::new(&markers.new_client),
        )
    }

    pub fn extract(&self, text: &str) -> TripDescriptor {
        let (pickup, destination) = endpoints(text);
        TripDescriptor {
            distance_km: distance_km(text),
            suggested_price: price(text),
            pickup,
            destination,
            has_multiple_stops: self.stop_markers.matches(text),
            is_new_client: self.new_client_markers.matches(text),
            passenger_rating: rating(text),
        }
    }
}

fn distance_km(text: &str) -> Option<f64> {
    let caps = DISTANCE.captures(text)?;
    let value = parse_number(&caps[1])?;
    let unit = caps[2].to_lowercase();
    if unit.starts_with('k') {
        Some(value)
    } else {
        Some(value / 1000.0)
    }
}

fn price(text: &str) -> Option<u32> {
    let caps = PRICE.captures(text)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?;
    let value = parse_number(raw.as_str())?.round();
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

fn rating(text: &str) -> Option<f64> {
    let caps = RATING.captures(text)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    let value: f64 = raw.as_str().replace(',', ".").parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Pickup and destination hints from labelled segments, falling back to an
/// `A → B` arrow form.
fn endpoints(text: &str) -> (Option<String>, Option<String>) {
    let mut pickup = None;
    let mut destination = None;

    let labels: Vec<_> = LABEL.captures_iter(text).collect();
    for (i, caps) in labels.iter().enumerate() {
        let Some(whole) = caps.get(0) else { continue };
        let next_label = labels
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map_or(text.len(), |m| m.start());
        let rest = &text[whole.end()..next_label];
        let segment = rest
            .find(SEGMENT_BREAKS)
            .map_or(rest, |end| &rest[..end]);
        let Some(value) = clean(segment) else { continue };

        let label = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let slot = match label.as_str() {
            "desde" | "origen" | "recogida" | "pickup" | "from" => &mut pickup,
            _ => &mut destination,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    if pickup.is_none() && destination.is_none() {
        if let Some(caps) = ARROW.captures(text) {
            pickup = clean(&caps[1]);
            destination = clean(&caps[2]);
        }
    }

    (pickup, destination)
}

fn clean(segment: &str) -> Option<String> {
    let trimmed = segment.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a number that may use `.` or `,` as decimal or thousands separator.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches(['.', ',']);
    let Some(pos) = trimmed.rfind(['.', ',']) else {
        return trimmed.parse().ok();
    };
    let (int_part, frac_part) = (&trimmed[..pos], &trimmed[pos + 1..]);
    let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
    let thousands = frac_part.len() == 3 && !int_digits.is_empty() && !int_digits.starts_with('0');
    if thousands {
        format!("{int_digits}{frac_part}").parse().ok()
    } else {
        format!("{int_digits}.{frac_part}").parse().ok()
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
