//! Per-request duplicate tracking for recommendations.

use std::collections::HashSet;

/// Tracks excluded and already emitted identifiers for one request
///
/// Lives only for the request that created it.
#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    excluded: HashSet<String>,
    seen: HashSet<String>,
}

impl DedupTracker {
    /// Create a tracker that never admits any of `excluded`
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
            seen: HashSet::new(),
        }
    }

    /// Admit an identifier, recording it as emitted
    ///
    /// Returns `false` for empty, excluded, or already emitted identifiers.
    pub fn admit(&mut self, id: &str) -> bool {
        if id.is_empty() || self.excluded.contains(id) || self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string())
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of identifiers admitted so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_rejects_excluded_and_repeats() {
        let mut tracker = DedupTracker::new(["A", "B"]);

        assert!(!tracker.admit("A"));
        assert!(tracker.admit("C"));
        assert!(!tracker.admit("C"));
        assert!(!tracker.admit(""));
        assert!(tracker.admit("D"));

        assert!(tracker.is_excluded("B"));
        assert!(tracker.has_seen("C"));
        assert!(!tracker.has_seen("A"));
        assert_eq!(tracker.seen_count(), 2);
    }
}
