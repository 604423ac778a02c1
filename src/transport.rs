//! Transport interface for remote lookups.
//!
//! The engine builds a [`LookupRequest`] and hands it to a [`Transport`].
//! The transport answers later by calling
//! [`QueryEngine::on_response`](crate::engine::QueryEngine::on_response)
//! with the request's token; the engine decides whether that answer is still
//! wanted. No HTTP client ships with this crate.

use crate::config::Options;
use crate::error::{TransportError, TransportResult};
use crate::types::{Params, RequestToken, Suggestion};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A remote lookup ready to be sent.
///
/// The body is a JSON object carrying the query under the configured
/// parameter name plus the extra parameters, unless `ignoreParams` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRequest {
    pub token: RequestToken,
    /// Normalized query this request resolves.
    pub query: String,
    /// Parameters that were active when the request was issued.
    pub params: Params,
    pub url: String,
    pub body: Map<String, Value>,
}

impl LookupRequest {
    /// Builds the request for `query` from the current options.
    ///
    /// Returns `None` when no remote source is configured.
    #[must_use]
    pub fn build(options: &Options, token: RequestToken, query: &str) -> Option<Self> {
        let service_url = options.service_url.as_ref()?;

        let mut body = Map::new();
        if !options.ignore_params {
            for (key, value) in &options.params {
                body.insert(key.clone(), Value::String(value.clone()));
            }
        }
        body.insert(options.param_name.clone(), Value::String(query.to_string()));

        Some(Self {
            token,
            query: query.to_string(),
            params: options.params.clone(),
            url: service_url.resolve(query),
            body,
        })
    }

    /// Serialized request body.
    #[must_use]
    pub fn body_json(&self) -> String {
        Value::Object(self.body.clone()).to_string()
    }
}

/// Best-effort cancellation of an in-flight lookup.
///
/// Dropping the handle does not cancel; only [`CancelHandle::cancel`] does.
#[derive(Default)]
pub struct CancelHandle(Option<Box<dyn FnOnce() + Send>>);

impl CancelHandle {
    /// A handle that does nothing when cancelled.
    #[must_use]
    pub fn noop() -> Self {
        Self(None)
    }

    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(cancel)))
    }

    /// Asks the transport to abandon the lookup.
    pub fn cancel(self) {
        if let Some(cancel) = self.0 {
            cancel();
        }
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.0.is_some() { "active" } else { "noop" };
        write!(f, "CancelHandle({kind})")
    }
}

/// Sends lookups on behalf of the engine.
pub trait Transport: Send {
    /// Starts `request`. The result must be delivered back to the engine
    /// with `request.token`; it may arrive in any order relative to others.
    fn send(&mut self, request: LookupRequest) -> CancelHandle;
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    suggestions: Vec<Value>,
}

/// Decodes a `{"suggestions": [...]}` response body.
///
/// Entries are normalized like static lookup entries.
///
/// # Errors
///
/// Returns `TransportError::Decode` if the body is not such an object.
pub fn decode_response(body: &str) -> TransportResult<Vec<Suggestion>> {
    let parsed: ResponseBody =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(crate::config::normalize_lookup(parsed.suggestions))
}
