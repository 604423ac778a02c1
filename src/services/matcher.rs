//! In-memory filtering of a static candidate list.

use crate::config::MatchMode;
use crate::types::Suggestion;

/// Filters candidates against the current query.
///
/// Comparison is case-insensitive. Results keep the order of the source
/// list; no scoring is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMatcher {
    mode: MatchMode,
}

impl LocalMatcher {
    #[must_use]
    pub const fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MatchMode) {
        self.mode = mode;
    }

    /// Returns the candidates matching `query`, in source order.
    #[must_use]
    pub fn filter(&self, candidates: &[Suggestion], query: &str) -> Vec<Suggestion> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        candidates
            .iter()
            .filter(|candidate| self.matches(&candidate.value.to_lowercase(), &needle))
            .cloned()
            .collect()
    }

    fn matches(&self, haystack: &str, needle: &str) -> bool {
        match self.mode {
            MatchMode::Contains => haystack.contains(needle),
            MatchMode::Prefix => haystack.starts_with(needle),
        }
    }
}
