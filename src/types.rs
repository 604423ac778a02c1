//! Type-safe newtypes and core data shapes for the suggestions engine.
//!
//! These types are shared by every component: the matcher and cache hold
//! [`Suggestion`]s, the coordinator hands out [`RequestToken`]s, and the
//! registry keys engines by [`InputId`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Extra request parameters attached to every remote lookup.
///
/// A `BTreeMap` keeps iteration order stable so that two equal parameter
/// sets always hash and serialize identically. Parameters take part in the
/// cache key and the bad-query key.
pub type Params = BTreeMap<String, String>;

/// A single candidate shown to the user.
///
/// `value` is the text written into the input on selection, `data` is an
/// arbitrary payload handed back to the selection callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Suggestion {
    /// Creates a suggestion with an explicit payload.
    #[must_use]
    pub fn new(value: impl Into<String>, data: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            data: data.into(),
        }
    }

    /// Creates a suggestion whose payload is its own value.
    ///
    /// This is the normalized form of a bare string lookup entry.
    #[must_use]
    pub fn from_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let data = serde_json::Value::String(value.clone());
        Self { value, data }
    }
}

impl From<&str> for Suggestion {
    fn from(value: &str) -> Self {
        Self::from_value(value)
    }
}

impl From<String> for Suggestion {
    fn from(value: String) -> Self {
        Self::from_value(value)
    }
}

/// Identifier assigned to each issued remote lookup.
///
/// Tokens increase monotonically per engine. Only the response carrying the
/// latest token is allowed to change what the user sees.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

impl RequestToken {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the token that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0;
        write!(f, "req:{id}")
    }
}

/// Identifier of the text input an engine is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(pub u64);

impl InputId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0;
        write!(f, "input:{id}")
    }
}

impl From<u64> for InputId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// Compile-time assertions for thread safety.
// The async driver moves engines and their results across tasks.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Suggestion>();
    assert_send_sync::<RequestToken>();
    assert_send_sync::<InputId>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_mirrors_data() {
        let s = Suggestion::from_value("Jamaica");
        assert_eq!(s.value, "Jamaica");
        assert_eq!(s.data, serde_json::json!("Jamaica"));
    }

    #[test]
    fn test_suggestion_deserialize_without_data() {
        let s: Suggestion = serde_json::from_str(r#"{"value":"A"}"#).unwrap();
        assert_eq!(s.value, "A");
        assert!(s.data.is_null());
    }

    #[test]
    fn test_token_ordering() {
        let first = RequestToken::new(1);
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.as_u64(), 2);
        assert_eq!(second.to_string(), "req:2");
    }
}
