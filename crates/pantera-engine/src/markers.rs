//! Case-insensitive substring markers.

/// A set of lowercased markers. Blank entries are discarded so they can
/// never match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
    markers: Vec<String>,
}

impl MarkerSet {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// First marker contained in `text`, if any.
    pub fn find(&self, text: &str) -> Option<&str> {
        if self.markers.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        self.markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_containment() {
        let set = MarkerSet::new(["KM", "Precio"]);
        assert!(set.matches("5.2 km"));
        assert!(set.matches("PRECIO sugerido"));
        assert!(!set.matches("Ajustes"));
    }

    #[test]
    fn test_find_reports_first_configured_marker() {
        let set = MarkerSet::new(["$", "km"]);
        assert_eq!(set.find("5 km, $90"), Some("$"));
    }

    #[test]
    fn test_blank_markers_discarded() {
        let set = MarkerSet::new(["", "  ", "ofertar"]);
        assert_eq!(set.len(), 1);
        assert!(!set.matches("anything else"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = MarkerSet::new(Vec::<String>::new());
        assert!(set.is_empty());
        assert!(!set.matches(""));
    }
}
