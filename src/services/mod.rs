//! Leaf components owned by the query engine.

pub mod bad_query;
pub mod cache;
pub mod coordinator;
mod matcher;
pub mod selection;

pub use bad_query::BadQueryFilter;
pub use cache::ResponseCache;
pub use coordinator::{InFlight, PendingLookup, RequestCoordinator};
pub use matcher::LocalMatcher;
pub use selection::{Key, NavigationPolicy, Selection, SelectionState, Transition};
