//! Suppression of lookups that cannot return anything.
//!
//! Once a query comes back empty, every longer query starting with it is
//! assumed to be empty as well, as long as the request parameters are the
//! same. Parameter changes drop all records.

use crate::types::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
struct BadQuery {
    query: String,
    params: Params,
}

/// Remembers empty-yielding queries.
#[derive(Debug, Clone, Default)]
pub struct BadQueryFilter {
    enabled: bool,
    records: Vec<BadQuery>,
}

impl BadQueryFilter {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the filter. Disabling forgets every record.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.clear();
        }
        self.enabled = enabled;
    }

    /// Whether a lookup for `query` with `params` is known to be empty.
    ///
    /// Only strictly shorter recorded prefixes count.
    #[must_use]
    pub fn should_suppress(&self, query: &str, params: &Params) -> bool {
        self.enabled
            && self.records.iter().any(|bad| {
                bad.query.len() < query.len()
                    && query.starts_with(bad.query.as_str())
                    && bad.params == *params
            })
    }

    /// Records that `query` with `params` returned no suggestions.
    pub fn record(&mut self, query: &str, params: &Params) {
        if !self.enabled {
            return;
        }
        let entry = BadQuery {
            query: query.to_string(),
            params: params.clone(),
        };
        if !self.records.contains(&entry) {
            tracing::debug!("Recording bad query {query:?}");
            self.records.push(entry);
        }
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
