//! Human-friendly terminal output.
//!
//! [`TerminalRenderer`] is a [`Renderer`] drawing the suggestion list as
//! text lines. When `color` is true, matches are emitted with ANSI escape
//! codes via `owo_colors`; otherwise they are wrapped in brackets.

use crate::highlight::Segment;
use crate::render::{RenderContext, Renderer};
use crate::transport::LookupRequest;
use owo_colors::OwoColorize;
use std::io::{self, Write};

// ── suggestions ─────────────────────────────────────────────────────────────

pub fn fmt_suggestions(w: &mut impl Write, ctx: &RenderContext<'_>, color: bool) -> io::Result<()> {
    for index in 0..ctx.suggestions.len() {
        let marker = if ctx.is_active(index) { '›' } else { ' ' };
        write!(w, "{marker} ")?;
        for segment in ctx.segments(index).unwrap_or_default() {
            fmt_segment(w, &segment, color)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn fmt_segment(w: &mut impl Write, segment: &Segment, color: bool) -> io::Result<()> {
    match (segment.matched, color) {
        (true, true) => write!(w, "{}", segment.text.bold().yellow()),
        (true, false) => write!(w, "[{}]", segment.text),
        (false, _) => write!(w, "{}", segment.text),
    }
}

pub fn fmt_hint(w: &mut impl Write, hint: &str, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{}", hint.dimmed())
    } else {
        writeln!(w, "{hint}")
    }
}

// ── request ─────────────────────────────────────────────────────────────────

pub fn fmt_request(w: &mut impl Write, request: &LookupRequest, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{} {}", "POST".bold(), request.url.green())?;
    } else {
        writeln!(w, "POST {}", request.url)?;
    }
    writeln!(w, "{}", request.body_json())
}

// ── renderer ────────────────────────────────────────────────────────────────

/// Draws suggestions to a writer, one frame per render.
pub struct TerminalRenderer<W> {
    out: W,
    color: bool,
    columns: f64,
    input: String,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            columns: 80.0,
            input: String::new(),
        }
    }

    /// Last value written into the simulated input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    fn report(result: io::Result<()>) {
        if let Err(e) = result {
            tracing::warn!("Failed to write suggestions: {e}");
        }
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        let result = writeln!(self.out, "── {:?} ──", ctx.query)
            .and_then(|()| fmt_suggestions(&mut self.out, ctx, self.color));
        Self::report(result);
    }

    fn show_hint(&mut self, hint: Option<&str>) {
        if let Some(hint) = hint {
            Self::report(fmt_hint(&mut self.out, hint, self.color));
        }
    }

    fn measure_width(&self) -> f64 {
        self.columns
    }

    fn hide(&mut self) {
        Self::report(self.out.flush());
    }

    fn write_input(&mut self, value: &str) {
        self.input = value.to_string();
        let result = if self.color {
            writeln!(self.out, "selected: {}", value.bold())
        } else {
            writeln!(self.out, "selected: {value}")
        };
        Self::report(result);
    }
}
