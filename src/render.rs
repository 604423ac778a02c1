//! Render interface consumed by the engine.
//!
//! The engine never draws anything itself. Every transition into, out of or
//! within the visible state is pushed to a [`Renderer`] together with the
//! full suggestion list and the active index.

use crate::highlight::{self, Segment};
use crate::types::Suggestion;

/// Hint shown above the list when no custom hint is configured.
pub const DEFAULT_HINT: &str = "Select an option below or keep typing";

/// Width used when the renderer cannot measure the bound input.
pub const FALLBACK_WIDTH: f64 = 300.0;

/// Everything a renderer needs to draw the list.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Normalized query the list was resolved for.
    pub query: &'a str,
    pub suggestions: &'a [Suggestion],
    pub active_index: Option<usize>,
    /// Container width in pixels.
    pub width: f64,
}

impl RenderContext<'_> {
    /// Highlighted segments of the suggestion at `index`.
    #[must_use]
    pub fn segments(&self, index: usize) -> Option<Vec<Segment>> {
        let suggestion = self.suggestions.get(index)?;
        Some(highlight::highlight(&suggestion.value, self.query))
    }

    /// HTML markup of the suggestion at `index`.
    #[must_use]
    pub fn markup(&self, index: usize) -> Option<String> {
        self.segments(index).map(|s| highlight::to_markup(&s))
    }

    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.active_index == Some(index)
    }
}

/// Presentation collaborator.
pub trait Renderer: Send {
    /// Draws (or redraws) the list.
    fn render(&mut self, ctx: &RenderContext<'_>);

    /// Shows `hint` above the list, or removes it when `None`.
    fn show_hint(&mut self, hint: Option<&str>);

    /// Width of the bound input in pixels, `0.0` when unknown.
    fn measure_width(&self) -> f64;

    /// Hides the list.
    fn hide(&mut self);

    /// Writes a committed value into the bound input.
    fn write_input(&mut self, value: &str);

    /// Removes every display element created for this engine.
    fn teardown(&mut self) {}
}
