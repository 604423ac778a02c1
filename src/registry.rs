//! Per-input engine store.
//!
//! Hosts that attach suggestions to several inputs keep one engine per
//! [`InputId`] here. Disposing an input tears its engine down and forgets
//! it, so a later lookup for the same input finds nothing.

use crate::engine::QueryEngine;
use crate::render::Renderer;
use crate::transport::Transport;
use crate::types::InputId;
use ahash::AHashMap;

pub struct Registry<T, R> {
    engines: AHashMap<InputId, QueryEngine<T, R>>,
}

impl<T, R> Default for Registry<T, R> {
    fn default() -> Self {
        Self {
            engines: AHashMap::new(),
        }
    }
}

impl<T: Transport, R: Renderer> Registry<T, R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `engine` to `input`.
    ///
    /// An engine already attached to the same input is disposed first.
    pub fn attach(&mut self, input: InputId, engine: QueryEngine<T, R>) {
        if let Some(mut previous) = self.engines.insert(input, engine) {
            tracing::debug!("Replacing engine attached to {input}");
            previous.dispose();
        }
    }

    #[must_use]
    pub fn get(&self, input: InputId) -> Option<&QueryEngine<T, R>> {
        self.engines.get(&input)
    }

    pub fn get_mut(&mut self, input: InputId) -> Option<&mut QueryEngine<T, R>> {
        self.engines.get_mut(&input)
    }

    /// Disposes and removes the engine attached to `input`.
    ///
    /// Returns `false` if nothing was attached.
    pub fn dispose(&mut self, input: InputId) -> bool {
        match self.engines.remove(&input) {
            Some(mut engine) => {
                engine.dispose();
                true
            }
            None => false,
        }
    }

    /// Disposes every attached engine.
    pub fn dispose_all(&mut self) {
        for (_, mut engine) in self.engines.drain() {
            engine.dispose();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
