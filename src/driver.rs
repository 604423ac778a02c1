//! Tokio event loop around a [`QueryEngine`].
//!
//! The engine is owned by a single task. Input, keys, pointer events and
//! transport answers all arrive on one channel and are handled to completion
//! one at a time, so the engine never needs a lock. The debounce deadline is
//! turned into a `sleep_until` raced against the channel.
//!
//! ```text
//!  DriverHandle ──Event──▶ ┌──────────────┐ ──send──▶ FetchTransport
//!                          │  event loop  │              │ tokio::spawn(fetch)
//!  sleep_until(deadline) ─▶│ QueryEngine  │ ◀─Response───┘
//!                          └──────────────┘
//! ```

use crate::config::OptionsPatch;
use crate::engine::QueryEngine;
use crate::error::TransportResult;
use crate::render::Renderer;
use crate::services::Key;
use crate::transport::{CancelHandle, LookupRequest, Transport};
use crate::types::{RequestToken, Suggestion};
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Something that happened to the bound input or its lookups.
#[derive(Debug)]
pub enum Event {
    Input(String),
    Key(Key),
    /// Pointer click on a suggestion.
    Select(usize),
    /// Pointer moved over a suggestion.
    Hover(usize),
    /// Blur or outside click.
    Dismiss,
    Response {
        token: RequestToken,
        result: TransportResult<Vec<Suggestion>>,
    },
    SetOptions(OptionsPatch),
    Snapshot(oneshot::Sender<Snapshot>),
    Dispose,
}

/// Point-in-time copy of the engine's display state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub value: String,
    pub query: String,
    pub visible: bool,
    pub suggestions: Vec<Suggestion>,
    pub active_index: Option<usize>,
    pub debounce_pending: bool,
    pub cached_queries: usize,
}

impl Snapshot {
    fn of<T, R>(engine: &QueryEngine<T, R>) -> Self {
        Self {
            value: engine.value().to_string(),
            query: engine.query().to_string(),
            visible: engine.is_visible(),
            suggestions: engine.suggestions().to_vec(),
            active_index: engine.active_index(),
            debounce_pending: engine.pending_deadline().is_some(),
            cached_queries: engine.cache().len(),
        }
    }
}

/// Future returned by a fetch function.
pub type FetchFuture = Pin<Box<dyn Future<Output = TransportResult<Vec<Suggestion>>> + Send>>;

type FetchFn = Arc<dyn Fn(LookupRequest) -> FetchFuture + Send + Sync>;

/// [`Transport`] running an async fetch function per lookup.
///
/// Each lookup is a spawned task posting its answer back into the event
/// loop; cancelling aborts the task. The transport only holds a weak sender,
/// so it does not keep the loop alive on its own.
pub struct FetchTransport {
    events: mpsc::WeakUnboundedSender<Event>,
    fetch: FetchFn,
}

impl Transport for FetchTransport {
    fn send(&mut self, request: LookupRequest) -> CancelHandle {
        let token = request.token;
        let future = (self.fetch)(request);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = future.await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(Event::Response { token, result });
            }
        });
        CancelHandle::new(move || task.abort())
    }
}

/// Channel pair waiting for an engine.
pub struct Driver {
    events: mpsc::UnboundedSender<Event>,
    inbox: mpsc::UnboundedReceiver<Event>,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    #[must_use]
    pub fn new() -> Self {
        let (events, inbox) = mpsc::unbounded_channel();
        Self { events, inbox }
    }

    /// Builds a transport whose answers are routed into this driver.
    pub fn fetch_transport<F, Fut>(&self, fetch: F) -> FetchTransport
    where
        F: Fn(LookupRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransportResult<Vec<Suggestion>>> + Send + 'static,
    {
        FetchTransport {
            events: self.events.downgrade(),
            fetch: Arc::new(move |request| Box::pin(fetch(request)) as FetchFuture),
        }
    }

    /// Moves `engine` onto its own task and starts the event loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, R>(self, engine: QueryEngine<T, R>) -> DriverHandle
    where
        T: Transport + 'static,
        R: Renderer + 'static,
    {
        let task = tokio::spawn(run(engine, self.inbox));
        DriverHandle {
            events: self.events,
            task,
        }
    }
}

/// Sends events to a running engine.
///
/// Every sender returns `false` once the loop has stopped.
pub struct DriverHandle {
    events: mpsc::UnboundedSender<Event>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    pub fn input(&self, text: impl Into<String>) -> bool {
        self.send(Event::Input(text.into()))
    }

    pub fn key(&self, key: Key) -> bool {
        self.send(Event::Key(key))
    }

    pub fn select(&self, index: usize) -> bool {
        self.send(Event::Select(index))
    }

    pub fn hover(&self, index: usize) -> bool {
        self.send(Event::Hover(index))
    }

    pub fn dismiss(&self) -> bool {
        self.send(Event::Dismiss)
    }

    pub fn set_options(&self, patch: OptionsPatch) -> bool {
        self.send(Event::SetOptions(patch))
    }

    /// Current display state, or `None` if the loop has stopped.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, response) = oneshot::channel();
        if !self.send(Event::Snapshot(reply)) {
            return None;
        }
        response.await.ok()
    }

    /// Disposes the engine and waits for the loop to finish.
    pub async fn dispose(self) {
        let _ = self.events.send(Event::Dispose);
        if let Err(e) = self.task.await {
            tracing::warn!("Suggestions driver task ended abnormally: {e}");
        }
    }

    fn send(&self, event: Event) -> bool {
        self.events.send(event).is_ok()
    }
}

async fn run<T: Transport, R: Renderer>(
    mut engine: QueryEngine<T, R>,
    mut inbox: mpsc::UnboundedReceiver<Event>,
) {
    loop {
        let deadline = engine.pending_deadline();
        tokio::select! {
            event = inbox.recv() => {
                let Some(event) = event else { break };
                if handle(&mut engine, event).is_break() {
                    break;
                }
            }
            () = wait_until(deadline) => {
                engine.on_timer(now());
            }
        }
    }
    engine.dispose();
}

fn handle<T: Transport, R: Renderer>(
    engine: &mut QueryEngine<T, R>,
    event: Event,
) -> ControlFlow<()> {
    match event {
        Event::Input(text) => {
            engine.on_input_changed(&text, now());
        }
        Event::Key(key) => {
            engine.on_key(key);
        }
        Event::Select(index) => {
            engine.select(index);
        }
        Event::Hover(index) => {
            engine.hover(index);
        }
        Event::Dismiss => engine.dismiss(),
        Event::Response { token, result } => {
            engine.on_response(token, result);
        }
        Event::SetOptions(patch) => {
            if let Err(e) = engine.set_options(patch) {
                tracing::warn!("Rejected options update: {e}");
            }
        }
        Event::Snapshot(reply) => {
            let _ = reply.send(Snapshot::of(engine));
        }
        Event::Dispose => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

/// Current time on tokio's clock, so paused test clocks apply.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

async fn wait_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
