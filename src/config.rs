//! Engine configuration.
//!
//! [`Options`] mirrors the configuration surface of a suggestions widget and
//! deserializes from camelCase JSON (`serviceUrl`, `minChars`,
//! `deferRequestBy`, ...). Callbacks and URL builder functions can only be
//! set from Rust. [`OptionsPatch`] carries a partial update for
//! [`QueryEngine::set_options`](crate::engine::QueryEngine::set_options).

use crate::error::{ConfigError, ConfigResult};
use crate::render::RenderContext;
use crate::types::{Params, Suggestion};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default request parameter name carrying the query.
pub const DEFAULT_PARAM_NAME: &str = "query";

/// Default bound on cached result sets.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Invoked with the chosen suggestion on commit.
pub type SelectCallback = Arc<dyn Fn(&Suggestion) + Send + Sync>;

/// Invoked with the render context right before the list is drawn.
pub type BeforeRenderCallback = Arc<dyn Fn(&RenderContext<'_>) + Send + Sync>;

/// Maps a query to a complete lookup URL.
pub type UrlBuilder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Where remote lookups are sent.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum ServiceUrl {
    /// Fixed endpoint; the query travels in the request body.
    Static(String),
    /// Endpoint computed from the query.
    Dynamic(UrlBuilder),
}

impl ServiceUrl {
    /// Creates a URL source from a builder function.
    pub fn dynamic(builder: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(builder))
    }

    /// Resolves the endpoint for `query`.
    #[must_use]
    pub fn resolve(&self, query: &str) -> String {
        match self {
            Self::Static(url) => url.clone(),
            Self::Dynamic(builder) => builder(query),
        }
    }

    /// Whether both values address the same lookup source.
    ///
    /// Builder functions are compared by identity.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<String> for ServiceUrl {
    fn from(url: String) -> Self {
        Self::Static(url)
    }
}

impl From<&str> for ServiceUrl {
    fn from(url: &str) -> Self {
        Self::Static(url.to_string())
    }
}

impl fmt::Debug for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(url) => f.debug_tuple("Static").field(url).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// Hint line shown above a visible suggestion list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawHint")]
pub enum Hint {
    /// Show [`DEFAULT_HINT`](crate::render::DEFAULT_HINT).
    #[default]
    Default,
    /// Show this text verbatim.
    Custom(String),
    /// Show nothing.
    Disabled,
}

impl Hint {
    /// Text to display, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Default => Some(crate::render::DEFAULT_HINT),
            Self::Custom(text) => Some(text),
            Self::Disabled => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHint {
    Flag(bool),
    Text(String),
}

impl From<RawHint> for Hint {
    fn from(raw: RawHint) -> Self {
        match raw {
            RawHint::Flag(true) => Self::Default,
            RawHint::Flag(false) => Self::Disabled,
            RawHint::Text(text) => Self::Custom(text),
        }
    }
}

/// How the local matcher compares candidates with the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Candidate contains the query anywhere.
    #[default]
    Contains,
    /// Candidate starts with the query.
    Prefix,
}

/// Width handed to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "RawWidth")]
pub enum Width {
    /// Ask the renderer to measure the bound input.
    #[default]
    Auto,
    Fixed(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWidth {
    Fixed(f64),
    Keyword(String),
}

impl From<RawWidth> for Width {
    fn from(raw: RawWidth) -> Self {
        match raw {
            RawWidth::Fixed(px) => Self::Fixed(px),
            RawWidth::Keyword(_) => Self::Auto,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Remote lookup source. Ignored while `lookup` is set.
    pub service_url: Option<ServiceUrl>,
    /// Static candidate list resolved locally.
    #[serde(deserialize_with = "deserialize_lookup")]
    pub lookup: Option<Vec<Suggestion>>,
    /// Request body key carrying the query.
    pub param_name: String,
    /// Minimum query length (in chars) before anything is resolved.
    pub min_chars: usize,
    /// Debounce window for remote lookups.
    #[serde(deserialize_with = "deserialize_millis")]
    pub defer_request_by: Duration,
    /// Suppress lookups extending a query known to yield nothing.
    pub prevent_bad_queries: bool,
    /// Auto-select when exactly one result equals the typed text.
    pub trigger_select_on_valid_input: bool,
    /// Activate the first suggestion whenever results are shown.
    pub auto_select_first: bool,
    /// Let `Up` from the first suggestion return to the typed text.
    pub allow_free_text: bool,
    /// Wrap keyboard navigation around the ends of the list.
    pub wrap_selection: bool,
    pub match_mode: MatchMode,
    /// Lower-case the query before matching and caching.
    pub lowercase_query: bool,
    pub cache_capacity: usize,
    pub hint: Hint,
    /// Leave `params` out of the request body.
    pub ignore_params: bool,
    pub params: Params,
    pub width: Width,
    #[serde(skip)]
    pub on_select: Option<SelectCallback>,
    #[serde(skip)]
    pub before_render: Option<BeforeRenderCallback>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            service_url: None,
            lookup: None,
            param_name: DEFAULT_PARAM_NAME.to_string(),
            min_chars: 1,
            defer_request_by: Duration::ZERO,
            prevent_bad_queries: true,
            trigger_select_on_valid_input: true,
            auto_select_first: false,
            allow_free_text: true,
            wrap_selection: false,
            match_mode: MatchMode::Contains,
            lowercase_query: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            hint: Hint::Default,
            ignore_params: false,
            params: Params::new(),
            width: Width::Auto,
            on_select: None,
            before_render: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("service_url", &self.service_url)
            .field("lookup", &self.lookup.as_ref().map(Vec::len))
            .field("param_name", &self.param_name)
            .field("min_chars", &self.min_chars)
            .field("defer_request_by", &self.defer_request_by)
            .field("prevent_bad_queries", &self.prevent_bad_queries)
            .field("trigger_select_on_valid_input", &self.trigger_select_on_valid_input)
            .field("auto_select_first", &self.auto_select_first)
            .field("hint", &self.hint)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Options for a remote source at `url`.
    #[must_use]
    pub fn remote(url: impl Into<ServiceUrl>) -> Self {
        Self {
            service_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Options for a static candidate list.
    #[must_use]
    pub fn local<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Suggestion>,
    {
        Self {
            lookup: Some(items.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Sets the selection callback.
    #[must_use]
    pub fn on_select(mut self, callback: impl Fn(&Suggestion) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(callback));
        self
    }

    /// Sets the pre-render callback.
    #[must_use]
    pub fn before_render(
        mut self,
        callback: impl Fn(&RenderContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.before_render = Some(Arc::new(callback));
        self
    }

    /// Parses and validates options from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::InvalidValue` when validation fails.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`Options::from_json`].
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks the values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cacheCapacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.param_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "paramName",
                reason: "must not be empty".to_string(),
            });
        }
        if let Width::Fixed(px) = self.width {
            if !px.is_finite() || px <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "width",
                    reason: format!("must be a positive number of pixels, got {px}"),
                });
            }
        }
        Ok(())
    }

    /// Merges `patch` into these options and reports what changed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the merged options are invalid;
    /// the options are left untouched in that case.
    pub fn apply(&mut self, patch: OptionsPatch) -> ConfigResult<OptionsDelta> {
        let mut next = self.clone();
        let mut delta = OptionsDelta::default();

        if let Some(url) = patch.service_url {
            let same = match (&next.service_url, &url) {
                (Some(a), Some(b)) => a.same_source(b),
                (None, None) => true,
                _ => false,
            };
            delta.source_changed |= !same;
            next.service_url = url;
        }
        if let Some(lookup) = patch.lookup {
            delta.source_changed |= next.lookup != lookup;
            next.lookup = lookup;
        }
        if let Some(params) = patch.params {
            delta.params_changed = next.params != params;
            next.params = params;
        }
        if let Some(v) = patch.prevent_bad_queries {
            next.prevent_bad_queries = v;
        }
        if let Some(v) = patch.param_name {
            next.param_name = v;
        }
        if let Some(v) = patch.min_chars {
            next.min_chars = v;
        }
        if let Some(v) = patch.defer_request_by {
            next.defer_request_by = v;
        }
        if let Some(v) = patch.trigger_select_on_valid_input {
            next.trigger_select_on_valid_input = v;
        }
        if let Some(v) = patch.auto_select_first {
            next.auto_select_first = v;
        }
        if let Some(v) = patch.allow_free_text {
            next.allow_free_text = v;
        }
        if let Some(v) = patch.wrap_selection {
            next.wrap_selection = v;
        }
        if let Some(v) = patch.match_mode {
            next.match_mode = v;
        }
        if let Some(v) = patch.lowercase_query {
            next.lowercase_query = v;
        }
        if let Some(v) = patch.cache_capacity {
            next.cache_capacity = v;
        }
        if let Some(v) = patch.hint {
            next.hint = v;
        }
        if let Some(v) = patch.ignore_params {
            next.ignore_params = v;
        }
        if let Some(v) = patch.width {
            next.width = v;
        }
        if let Some(v) = patch.on_select {
            next.on_select = v;
        }
        if let Some(v) = patch.before_render {
            next.before_render = v;
        }

        next.validate()?;
        *self = next;
        Ok(delta)
    }
}

/// What a merged [`OptionsPatch`] changed about lookup identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionsDelta {
    /// `serviceUrl` or `lookup` now address a different source.
    pub source_changed: bool,
    /// Extra request parameters differ.
    pub params_changed: bool,
}

/// Partial options update. `None` leaves a field as it is.
///
/// Nullable fields use a nested `Option`: `Some(None)` clears them.
#[derive(Clone, Default)]
pub struct OptionsPatch {
    pub service_url: Option<Option<ServiceUrl>>,
    pub lookup: Option<Option<Vec<Suggestion>>>,
    pub param_name: Option<String>,
    pub min_chars: Option<usize>,
    pub defer_request_by: Option<Duration>,
    pub prevent_bad_queries: Option<bool>,
    pub trigger_select_on_valid_input: Option<bool>,
    pub auto_select_first: Option<bool>,
    pub allow_free_text: Option<bool>,
    pub wrap_selection: Option<bool>,
    pub match_mode: Option<MatchMode>,
    pub lowercase_query: Option<bool>,
    pub cache_capacity: Option<usize>,
    pub hint: Option<Hint>,
    pub ignore_params: Option<bool>,
    pub params: Option<Params>,
    pub width: Option<Width>,
    pub on_select: Option<Option<SelectCallback>>,
    pub before_render: Option<Option<BeforeRenderCallback>>,
}

impl fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("service_url", &self.service_url)
            .field("lookup", &self.lookup.as_ref().map(|l| l.as_ref().map(Vec::len)))
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl OptionsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn service_url(mut self, url: impl Into<ServiceUrl>) -> Self {
        self.service_url = Some(Some(url.into()));
        self
    }

    #[must_use]
    pub fn lookup<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Suggestion>,
    {
        self.lookup = Some(Some(items.into_iter().map(Into::into).collect()));
        self
    }

    /// Removes the static list so lookups go remote again.
    #[must_use]
    pub fn clear_lookup(mut self) -> Self {
        self.lookup = Some(None);
        self
    }

    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        self.param_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn prevent_bad_queries(mut self, enabled: bool) -> Self {
        self.prevent_bad_queries = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger_select_on_valid_input(mut self, enabled: bool) -> Self {
        self.trigger_select_on_valid_input = Some(enabled);
        self
    }

    #[must_use]
    pub fn ignore_params(mut self, ignore: bool) -> Self {
        self.ignore_params = Some(ignore);
        self
    }

    #[must_use]
    pub fn hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }

    #[must_use]
    pub fn min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = Some(min_chars);
        self
    }

    #[must_use]
    pub fn defer_request_by(mut self, delay: Duration) -> Self {
        self.defer_request_by = Some(delay);
        self
    }

    #[must_use]
    pub fn on_select(mut self, callback: impl Fn(&Suggestion) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Some(Arc::new(callback)));
        self
    }

    #[must_use]
    pub fn before_render(
        mut self,
        callback: impl Fn(&RenderContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.before_render = Some(Some(Arc::new(callback)));
        self
    }
}

/// Normalizes raw lookup entries into suggestions.
///
/// Strings, numbers and booleans become `{value: s, data: s}`. Objects must
/// carry a `value`; their `data` defaults to `null`. Anything else is
/// skipped with a warning rather than failing the whole list.
#[must_use]
pub fn normalize_lookup(entries: Vec<Value>) -> Vec<Suggestion> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let normalized = normalize_entry(entry);
            if normalized.is_none() {
                tracing::warn!("Skipping lookup entry {index}: no usable value");
            }
            normalized
        })
        .collect()
}

fn normalize_entry(entry: Value) -> Option<Suggestion> {
    match entry {
        Value::String(s) => Some(Suggestion::from_value(s)),
        Value::Number(n) => Some(Suggestion::from_value(n.to_string())),
        Value::Bool(b) => Some(Suggestion::from_value(b.to_string())),
        Value::Object(mut map) => {
            let value = match map.remove("value")? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            let data = map.remove("data").unwrap_or(Value::Null);
            Some(Suggestion { value, data })
        }
        Value::Null | Value::Array(_) => None,
    }
}

fn deserialize_lookup<'de, D>(deserializer: D) -> Result<Option<Vec<Suggestion>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(normalize_lookup))
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}
