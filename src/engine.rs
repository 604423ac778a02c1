//! Query engine: the orchestrator of the suggestion lifecycle.
//!
//! Every input change resolves to exactly one of: clearing the list, a
//! local match, a cache hit, a suppressed bad query, or a remote lookup
//! (immediate or debounced). Retyping the query of the outstanding lookup
//! changes nothing. Responses are applied only when their token is
//! still current, then cached and handed to the selection state machine,
//! which in turn drives the renderer.
//!
//! The engine is a plain `&mut self` state machine. It never spawns, never
//! sleeps and never blocks: time comes in as `now` arguments, answers come in
//! through [`QueryEngine::on_response`]. [`crate::driver`] wires it to tokio.

use crate::config::{Options, OptionsPatch, Width};
use crate::error::{ConfigResult, Result, SuggestError, TransportResult};
use crate::render::{RenderContext, Renderer, FALLBACK_WIDTH};
use crate::services::{
    BadQueryFilter, Key, LocalMatcher, NavigationPolicy, RequestCoordinator, ResponseCache,
    Selection, SelectionState, Transition,
};
use crate::transport::{LookupRequest, Transport};
use crate::types::{Params, RequestToken, Suggestion};
use std::time::Instant;

/// How an input change was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Query empty or below `minChars`; list hidden.
    Cleared,
    /// Resolved from the static candidate list.
    Local { count: usize },
    /// Served from the response cache.
    Cached { count: usize },
    /// Known to be empty; no lookup issued.
    Suppressed,
    /// Lookup sent right away.
    Requested(RequestToken),
    /// Lookup scheduled for the end of the debounce window.
    Deferred { deadline: Instant },
    /// Same query as the lookup already outstanding; nothing reissued.
    Unchanged,
    /// Neither a static list nor a service URL is configured.
    NoSource,
    /// The engine has been disposed.
    Disposed,
}

/// What happened to a transport answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Cached and displayed.
    Applied { count: usize },
    /// Transport error; shown as no suggestions, nothing cached.
    Failed,
    /// Token was superseded; ignored.
    Stale,
    Disposed,
}

/// Normalizes raw input text into a query.
#[must_use]
pub fn normalize_query(raw: &str, lowercase: bool) -> String {
    let trimmed = raw.trim();
    if lowercase {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Autocomplete engine bound to one text input.
pub struct QueryEngine<T, R> {
    options: Options,
    transport: T,
    renderer: R,
    matcher: LocalMatcher,
    bad_queries: BadQueryFilter,
    cache: ResponseCache,
    coordinator: RequestCoordinator,
    selection: Selection,
    /// Raw text of the bound input.
    value: String,
    /// Normalized form of `value`.
    query: String,
    disposed: bool,
}

impl<T: Transport, R: Renderer> QueryEngine<T, R> {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `options` fail validation.
    pub fn new(options: Options, transport: T, renderer: R) -> ConfigResult<Self> {
        options.validate()?;
        Ok(Self {
            matcher: LocalMatcher::new(options.match_mode),
            bad_queries: BadQueryFilter::new(options.prevent_bad_queries),
            cache: ResponseCache::new(options.cache_capacity),
            coordinator: RequestCoordinator::new(options.defer_request_by),
            selection: Selection::new(navigation_policy(&options)),
            options,
            transport,
            renderer,
            value: String::new(),
            query: String::new(),
            disposed: false,
        })
    }

    /// Handles a change of the bound input's text.
    ///
    /// Any pending debounce timer is reset, unless the text normalizes to the
    /// lookup already outstanding, which is left alone.
    pub fn on_input_changed(&mut self, raw: &str, now: Instant) -> Resolution {
        if self.disposed {
            return Resolution::Disposed;
        }

        self.value = raw.to_string();
        let query = normalize_query(raw, self.options.lowercase_query);
        if query == self.query
            && self.options.lookup.is_none()
            && query.chars().count() >= self.options.min_chars
            && self.coordinator.is_outstanding(&query, &self.options.params)
        {
            tracing::debug!("Query {query:?} unchanged, keeping outstanding lookup");
            return Resolution::Unchanged;
        }
        self.query.clone_from(&query);
        self.coordinator.clear_pending();

        if query.is_empty() || query.chars().count() < self.options.min_chars {
            self.coordinator.abandon_in_flight();
            let transition = self.selection.clear();
            self.apply(transition);
            return Resolution::Cleared;
        }

        if let Some(lookup) = &self.options.lookup {
            let results = self.matcher.filter(lookup, &query);
            let count = results.len();
            tracing::debug!("Local match for {query:?}: {count} suggestions");
            self.coordinator.abandon_in_flight();
            self.show(results);
            return Resolution::Local { count };
        }

        if self.options.service_url.is_none() {
            self.coordinator.abandon_in_flight();
            let transition = self.selection.clear();
            self.apply(transition);
            return Resolution::NoSource;
        }

        let params = self.options.params.clone();

        if self.bad_queries.should_suppress(&query, &params) {
            tracing::debug!("Suppressing lookup for {query:?}: extends a known empty query");
            self.coordinator.abandon_in_flight();
            let transition = self.selection.clear();
            self.apply(transition);
            return Resolution::Suppressed;
        }

        if let Some(cached) = self.cache.get(&query, &params) {
            let results = cached.to_vec();
            let count = results.len();
            tracing::debug!("Cache hit for {query:?}: {count} suggestions");
            self.coordinator.abandon_in_flight();
            self.show(results);
            return Resolution::Cached { count };
        }

        if self.coordinator.is_debounced() {
            self.coordinator.abandon_in_flight();
            let deadline = self.coordinator.defer(&query, &params, now);
            return Resolution::Deferred { deadline };
        }

        Resolution::Requested(self.issue(&query, &params))
    }

    /// Fires the debounced lookup if its deadline has passed.
    pub fn on_timer(&mut self, now: Instant) -> Option<RequestToken> {
        if self.disposed {
            return None;
        }
        let due = self.coordinator.take_due(now)?;
        Some(self.issue(&due.query, &due.params))
    }

    /// Applies a transport answer for `token`.
    pub fn on_response(
        &mut self,
        token: RequestToken,
        result: TransportResult<Vec<Suggestion>>,
    ) -> ResponseOutcome {
        if self.disposed {
            return ResponseOutcome::Disposed;
        }
        let Some(flight) = self.coordinator.complete(token) else {
            tracing::debug!("Discarding stale response {token}");
            return ResponseOutcome::Stale;
        };

        match result {
            Err(e) => {
                tracing::warn!("Lookup {token} for {:?} failed: {e}", flight.query);
                let transition = self.selection.clear();
                self.apply(transition);
                ResponseOutcome::Failed
            }
            Ok(results) => {
                let count = results.len();
                self.cache.put(&flight.query, &flight.params, results.clone());
                if results.is_empty() {
                    self.bad_queries.record(&flight.query, &flight.params);
                }
                self.show(results);
                ResponseOutcome::Applied { count }
            }
        }
    }

    /// Handles a key press. Returns `true` if the key changed anything.
    pub fn on_key(&mut self, key: Key) -> bool {
        if self.disposed {
            return false;
        }
        if key == Key::Escape {
            self.coordinator.reset();
        }
        let transition = self.selection.on_key(key);
        let changed = transition != Transition::Unchanged;
        self.apply(transition);
        changed
    }

    /// Commits the suggestion at `index` (pointer click).
    pub fn select(&mut self, index: usize) -> bool {
        if self.disposed {
            return false;
        }
        let transition = self.selection.select(index);
        let committed = matches!(transition, Transition::Committed(_));
        self.apply(transition);
        committed
    }

    /// Activates the suggestion at `index` without committing it.
    pub fn hover(&mut self, index: usize) -> bool {
        if self.disposed {
            return false;
        }
        let transition = self.selection.hover(index);
        let changed = transition != Transition::Unchanged;
        self.apply(transition);
        changed
    }

    /// Hides the list (blur, outside click) and drops outstanding lookups.
    pub fn dismiss(&mut self) {
        if self.disposed {
            return;
        }
        self.coordinator.reset();
        let transition = self.selection.dismiss();
        self.apply(transition);
    }

    /// Merges `patch` into the current options.
    ///
    /// Changing the lookup source clears the cache and the bad-query
    /// records; changing params clears the bad-query records. Both drop any
    /// outstanding lookup. Changing `minChars`, `lowercaseQuery` or
    /// `preventBadQueries` drops a debounced lookup that has not fired yet.
    ///
    /// # Errors
    ///
    /// Returns `SuggestError::Disposed` after [`dispose`](Self::dispose) and
    /// `SuggestError::Config` if the merged options are invalid.
    pub fn set_options(&mut self, patch: OptionsPatch) -> Result<()> {
        if self.disposed {
            return Err(SuggestError::Disposed);
        }
        let before = (
            self.options.min_chars,
            self.options.lowercase_query,
            self.options.prevent_bad_queries,
        );
        let delta = self.options.apply(patch)?;
        let after = (
            self.options.min_chars,
            self.options.lowercase_query,
            self.options.prevent_bad_queries,
        );

        // A waiting lookup was resolved under the old rules.
        if before != after {
            self.coordinator.clear_pending();
        }
        if delta.source_changed {
            tracing::debug!("Lookup source changed, invalidating cache");
            self.cache.clear();
            self.bad_queries.clear();
            self.coordinator.reset();
        }
        if delta.params_changed {
            tracing::debug!("Request params changed, forgetting bad queries");
            self.bad_queries.clear();
            self.coordinator.reset();
        }

        self.bad_queries.set_enabled(self.options.prevent_bad_queries);
        self.cache.resize(self.options.cache_capacity);
        self.matcher.set_mode(self.options.match_mode);
        self.selection.set_policy(navigation_policy(&self.options));
        self.coordinator.set_delay(self.options.defer_request_by);
        Ok(())
    }

    /// Releases everything: outstanding lookups, cache, bad queries and
    /// display elements. Later events are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!("Disposing suggestions engine");
        self.coordinator.reset();
        self.cache.clear();
        self.bad_queries.clear();
        self.selection.clear();
        self.renderer.hide();
        self.renderer.teardown();
        self.disposed = true;
    }

    fn issue(&mut self, query: &str, params: &Params) -> RequestToken {
        let token = self.coordinator.issue(query, params);
        if let Some(request) = LookupRequest::build(&self.options, token, query) {
            tracing::debug!("Issuing lookup {token} for {query:?} to {}", request.url);
            let cancel = self.transport.send(request);
            self.coordinator.attach_cancel(token, cancel);
        }
        token
    }

    fn show(&mut self, results: Vec<Suggestion>) {
        let exact = self.options.trigger_select_on_valid_input
            && matches!(results.as_slice(), [only] if only.value.to_lowercase() == self.query.to_lowercase());

        let transition = self
            .selection
            .set_results(results, self.options.auto_select_first);
        if exact {
            let transition = self.selection.select(0);
            self.apply(transition);
            return;
        }
        self.apply(transition);
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Unchanged => {}
            Transition::Redraw => self.redraw(),
            Transition::Hidden => self.renderer.hide(),
            Transition::Committed(suggestion) => self.commit(suggestion),
        }
    }

    fn redraw(&mut self) {
        let width = match self.options.width {
            Width::Fixed(px) => px,
            Width::Auto => {
                let measured = self.renderer.measure_width();
                if measured > 0.0 {
                    measured
                } else {
                    FALLBACK_WIDTH
                }
            }
        };
        let ctx = RenderContext {
            query: &self.query,
            suggestions: self.selection.suggestions(),
            active_index: self.selection.active_index(),
            width,
        };
        if let Some(before_render) = &self.options.before_render {
            before_render(&ctx);
        }
        self.renderer.render(&ctx);
        self.renderer.show_hint(self.options.hint.text());
    }

    fn commit(&mut self, suggestion: Suggestion) {
        tracing::debug!("Selected {:?}", suggestion.value);
        self.coordinator.reset();
        self.value.clone_from(&suggestion.value);
        self.query = normalize_query(&suggestion.value, self.options.lowercase_query);
        self.renderer.hide();
        self.renderer.write_input(&suggestion.value);
        if let Some(on_select) = &self.options.on_select {
            on_select(&suggestion);
        }
    }
}

impl<T, R> QueryEngine<T, R> {
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Raw text of the bound input as last seen by the engine.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Normalized query for the current value.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.selection.is_visible()
    }

    #[must_use]
    pub fn suggestions(&self) -> &[Suggestion] {
        self.selection.suggestions()
    }

    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.selection.active_index()
    }

    #[must_use]
    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// Deadline of the debounced lookup, if one is waiting.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.coordinator.pending_deadline()
    }

    /// Token of the lookup whose answer would currently be applied.
    #[must_use]
    pub fn current_token(&self) -> Option<RequestToken> {
        self.coordinator.in_flight().map(|f| f.token)
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[must_use]
    pub fn bad_queries(&self) -> &BadQueryFilter {
        &self.bad_queries
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

fn navigation_policy(options: &Options) -> NavigationPolicy {
    NavigationPolicy {
        allow_free_text: options.allow_free_text,
        wrap: options.wrap_selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderContext;
    use crate::transport::CancelHandle;

    #[derive(Default)]
    struct Sink {
        sent: Vec<LookupRequest>,
    }

    impl Transport for Sink {
        fn send(&mut self, request: LookupRequest) -> CancelHandle {
            self.sent.push(request);
            CancelHandle::noop()
        }
    }

    #[derive(Default)]
    struct Screen {
        rows: Vec<String>,
        visible: bool,
        input: String,
    }

    impl Renderer for Screen {
        fn render(&mut self, ctx: &RenderContext<'_>) {
            self.rows = ctx.suggestions.iter().map(|s| s.value.clone()).collect();
            self.visible = true;
        }
        fn show_hint(&mut self, _hint: Option<&str>) {}
        fn measure_width(&self) -> f64 {
            120.0
        }
        fn hide(&mut self) {
            self.visible = false;
        }
        fn write_input(&mut self, value: &str) {
            self.input = value.to_string();
        }
    }

    fn engine(options: Options) -> QueryEngine<Sink, Screen> {
        QueryEngine::new(options, Sink::default(), Screen::default()).unwrap()
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Jam  ", false), "Jam");
        assert_eq!(normalize_query("  Jam  ", true), "jam");
        assert_eq!(normalize_query(" \t ", false), "");
    }

    #[test]
    fn test_local_lookup_shows_results() {
        let mut engine = engine(Options::local(["Jamaica", "Japan"]));
        let resolution = engine.on_input_changed("Jam", Instant::now());
        assert_eq!(resolution, Resolution::Local { count: 1 });
        assert!(engine.is_visible());
        assert_eq!(engine.value(), "Jam");
        assert_eq!(engine.renderer().rows, vec!["Jamaica"]);
        assert!(engine.transport().sent.is_empty());
    }

    #[test]
    fn test_remote_lookup_round_trip() {
        let mut engine = engine(Options::remote("/some/url"));
        let Resolution::Requested(token) = engine.on_input_changed("Jam", Instant::now()) else {
            panic!("expected a request");
        };
        assert_eq!(engine.transport().sent.len(), 1);

        let outcome = engine.on_response(token, Ok(vec![Suggestion::from_value("Jamaica")]));
        assert_eq!(outcome, ResponseOutcome::Applied { count: 1 });
        assert!(engine.renderer().visible);
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn test_no_source_clears() {
        let mut engine = engine(Options::default());
        assert_eq!(engine.on_input_changed("Jam", Instant::now()), Resolution::NoSource);
        assert!(!engine.is_visible());
    }

    #[test]
    fn test_single_exact_result_is_selected() {
        let mut engine = engine(Options::local(["Jamaica", "Japan"]));
        engine.on_input_changed("jamaica", Instant::now());
        assert!(!engine.is_visible());
        assert_eq!(engine.renderer().input, "Jamaica");
        assert_eq!(engine.value(), "Jamaica");
    }

    #[test]
    fn test_disposed_engine_ignores_events() {
        let mut engine = engine(Options::local(["Jamaica"]));
        engine.dispose();
        assert_eq!(engine.on_input_changed("Jam", Instant::now()), Resolution::Disposed);
        assert!(!engine.on_key(Key::Down));
        assert!(matches!(
            engine.set_options(OptionsPatch::new().min_chars(2)),
            Err(SuggestError::Disposed)
        ));
    }
}
