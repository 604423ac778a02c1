//! suggestions: query/response lifecycle engine for autocomplete widgets.
//!
//! As the user types, the engine decides whether to match a static list,
//! serve a cached answer, skip a lookup known to be empty, or send a
//! (debounced) remote lookup. Out-of-order answers are reconciled with
//! monotonically increasing request tokens, and the resulting list, active
//! index and hint are pushed to a renderer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        Driver (tokio, single event loop)     │
//! │    input · keys · timer · transport answers  │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │               Query Engine                   │
//! │   normalize → local | bad | cache | remote   │
//! └───────┬─────────┬─────────┬─────────┬───────┘
//!         │         │         │         │
//!    ┌────▼───┐ ┌───▼───┐ ┌───▼───┐ ┌───▼────────┐
//!    │ Local  │ │  Bad  │ │  LRU  │ │  Request   │
//!    │Matcher │ │Queries│ │ Cache │ │Coordinator │
//!    └────┬───┘ └───────┘ └───────┘ └───┬────────┘
//!         │                             │ Transport
//!    ┌────▼─────────────────────────────▼────┐
//!    │       Selection State Machine          │
//!    └────────────────────┬──────────────────┘
//!                         │ Renderer
//!                    display layer
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod highlight;
pub mod registry;
pub mod render;
pub mod services;
pub mod transport;
pub mod types;

pub use config::{Hint, MatchMode, Options, OptionsPatch, ServiceUrl, Width};
pub use engine::{QueryEngine, Resolution, ResponseOutcome};
pub use error::{ConfigError, Result, SuggestError, TransportError};
pub use render::{RenderContext, Renderer, DEFAULT_HINT};
pub use services::Key;
pub use transport::{CancelHandle, LookupRequest, Transport};
pub use types::{InputId, Params, RequestToken, Suggestion};
