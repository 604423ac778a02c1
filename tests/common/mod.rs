//! Common test utilities for suggestions integration tests.
//!
//! Provides a renderer that records every call and a transport that only
//! records requests, so tests decide when and in which order answers land.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use suggestions::render::{RenderContext, Renderer};
use suggestions::transport::{CancelHandle, LookupRequest, Transport};
use suggestions::{Options, QueryEngine, RequestToken, Suggestion};

/// One call to `Renderer::render`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub query: String,
    pub values: Vec<String>,
    pub markup: Vec<String>,
    pub active: Option<usize>,
    pub width: f64,
}

/// Everything the engine asked the display layer to do.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub frames: Vec<Frame>,
    pub hint: Option<String>,
    pub hint_calls: usize,
    pub hide_calls: usize,
    pub visible: bool,
    pub input: String,
    /// Display elements currently alive (list container and preloader).
    pub elements: usize,
}

impl RenderLog {
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

/// Renderer writing into a shared [`RenderLog`].
pub struct RecordingRenderer {
    log: Arc<Mutex<RenderLog>>,
    width: f64,
}

impl RecordingRenderer {
    pub fn new() -> (Self, Arc<Mutex<RenderLog>>) {
        Self::with_width(240.0)
    }

    pub fn with_width(width: f64) -> (Self, Arc<Mutex<RenderLog>>) {
        let log = Arc::new(Mutex::new(RenderLog {
            elements: 2,
            ..RenderLog::default()
        }));
        let renderer = Self {
            log: Arc::clone(&log),
            width,
        };
        (renderer, log)
    }

    fn log(&self) -> MutexGuard<'_, RenderLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        let frame = Frame {
            query: ctx.query.to_string(),
            values: ctx.suggestions.iter().map(|s| s.value.clone()).collect(),
            markup: (0..ctx.suggestions.len())
                .filter_map(|i| ctx.markup(i))
                .collect(),
            active: ctx.active_index,
            width: ctx.width,
        };
        let mut log = self.log();
        log.frames.push(frame);
        log.visible = true;
    }

    fn show_hint(&mut self, hint: Option<&str>) {
        let mut log = self.log();
        log.hint = hint.map(str::to_string);
        log.hint_calls += 1;
    }

    fn measure_width(&self) -> f64 {
        self.width
    }

    fn hide(&mut self) {
        let mut log = self.log();
        log.visible = false;
        log.hint = None;
        log.hide_calls += 1;
    }

    fn write_input(&mut self, value: &str) {
        self.log().input = value.to_string();
    }

    fn teardown(&mut self) {
        self.log().elements = 0;
    }
}

/// Requests seen by a [`ManualTransport`], plus cancelled tokens.
#[derive(Debug, Default)]
pub struct Wire {
    pub requests: Vec<LookupRequest>,
    pub cancelled: Vec<RequestToken>,
}

impl Wire {
    pub fn queries(&self) -> Vec<String> {
        self.requests.iter().map(|r| r.query.clone()).collect()
    }
}

/// Transport that records requests and never answers by itself.
pub struct ManualTransport {
    wire: Arc<Mutex<Wire>>,
}

impl ManualTransport {
    pub fn new() -> (Self, Arc<Mutex<Wire>>) {
        let wire = Arc::new(Mutex::new(Wire::default()));
        (
            Self {
                wire: Arc::clone(&wire),
            },
            wire,
        )
    }
}

impl Transport for ManualTransport {
    fn send(&mut self, request: LookupRequest) -> CancelHandle {
        let token = request.token;
        self.wire.lock().unwrap().requests.push(request);
        let wire = Arc::clone(&self.wire);
        CancelHandle::new(move || wire.lock().unwrap().cancelled.push(token))
    }
}

/// An engine wired to a recording renderer and a manual transport.
pub struct TestEnv {
    pub engine: QueryEngine<ManualTransport, RecordingRenderer>,
    pub wire: Arc<Mutex<Wire>>,
    pub screen: Arc<Mutex<RenderLog>>,
}

impl TestEnv {
    pub fn new(options: Options) -> Self {
        let (transport, wire) = ManualTransport::new();
        let (renderer, screen) = RecordingRenderer::new();
        let engine =
            QueryEngine::new(options, transport, renderer).expect("Failed to create engine");
        Self {
            engine,
            wire,
            screen,
        }
    }

    /// Types `text` into the input at the current instant.
    pub fn type_text(&mut self, text: &str) -> suggestions::Resolution {
        self.engine.on_input_changed(text, Instant::now())
    }

    pub fn request_count(&self) -> usize {
        self.wire.lock().unwrap().requests.len()
    }

    pub fn last_request(&self) -> LookupRequest {
        self.wire
            .lock()
            .unwrap()
            .requests
            .last()
            .cloned()
            .expect("No request was sent")
    }

    pub fn screen(&self) -> MutexGuard<'_, RenderLog> {
        self.screen.lock().unwrap()
    }

    /// Answers the request carrying `token` with `values`.
    pub fn respond(&mut self, token: RequestToken, values: &[&str]) -> suggestions::ResponseOutcome {
        let results = values.iter().map(|v| Suggestion::from_value(*v)).collect();
        self.engine.on_response(token, Ok(results))
    }
}

/// Service URL used by remote tests.
pub const SERVICE_URL: &str = "/some/url";

pub fn remote() -> Options {
    Options::remote(SERVICE_URL)
}

pub fn suggestions(values: &[&str]) -> Vec<Suggestion> {
    values.iter().map(|v| Suggestion::from_value(*v)).collect()
}
