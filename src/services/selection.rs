//! Selection state machine.
//!
//! ```text
//!            results (non-empty)               Up/Down
//!   Hidden ─────────────────────▶ Visible ◀──────────────┐
//!     ▲                           { active: None | i } ──┘
//!     │ empty results, Escape,         │
//!     │ blur, commit                   │ Enter/Tab on Some(i), select(i)
//!     └────────────────────────────────┘
//! ```
//!
//! This is the only writer of the active index. Every method reports a
//! [`Transition`] so the engine knows whether the renderer must be told.

use crate::types::Suggestion;

/// Keys the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

/// Visibility and active index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Hidden,
    Visible { active: Option<usize> },
}

/// Outcome of an event, as far as display is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing the renderer needs to know about.
    Unchanged,
    /// The list became visible or its contents/active index changed.
    Redraw,
    /// The list went from visible to hidden.
    Hidden,
    /// A suggestion was chosen; the list is now hidden.
    Committed(Suggestion),
}

/// Keyboard navigation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationPolicy {
    /// `Up` from the first suggestion deactivates everything.
    pub allow_free_text: bool,
    /// Moving past either end wraps around instead of stopping.
    pub wrap: bool,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            allow_free_text: true,
            wrap: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    suggestions: Vec<Suggestion>,
    state: SelectionState,
    policy: NavigationPolicy,
}

impl Selection {
    #[must_use]
    pub fn new(policy: NavigationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn set_policy(&mut self, policy: NavigationPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self.state, SelectionState::Visible { .. })
    }

    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            SelectionState::Visible { active } => active,
            SelectionState::Hidden => None,
        }
    }

    #[must_use]
    pub fn active_suggestion(&self) -> Option<&Suggestion> {
        self.active_index().and_then(|i| self.suggestions.get(i))
    }

    #[must_use]
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Replaces the list with freshly resolved results.
    pub fn set_results(&mut self, results: Vec<Suggestion>, auto_select_first: bool) -> Transition {
        if results.is_empty() {
            self.suggestions.clear();
            return self.hide();
        }
        self.suggestions = results;
        self.state = SelectionState::Visible {
            active: auto_select_first.then_some(0),
        };
        Transition::Redraw
    }

    /// Clears the list and hides it.
    pub fn clear(&mut self) -> Transition {
        self.suggestions.clear();
        self.hide()
    }

    /// Hides the list from any state; the list itself is kept.
    pub fn dismiss(&mut self) -> Transition {
        self.hide()
    }

    /// Activates `index` without committing it (pointer hover).
    pub fn hover(&mut self, index: usize) -> Transition {
        if index >= self.suggestions.len() || !self.is_visible() {
            return Transition::Unchanged;
        }
        self.activate(Some(index))
    }

    /// Commits the suggestion at `index` (pointer click).
    ///
    /// Only a visible list can be committed from.
    pub fn select(&mut self, index: usize) -> Transition {
        if !self.is_visible() {
            return Transition::Unchanged;
        }
        let Some(chosen) = self.suggestions.get(index).cloned() else {
            return Transition::Unchanged;
        };
        self.suggestions.clear();
        self.state = SelectionState::Hidden;
        Transition::Committed(chosen)
    }

    /// Reacts to a key press.
    pub fn on_key(&mut self, key: Key) -> Transition {
        let SelectionState::Visible { active } = self.state else {
            return Transition::Unchanged;
        };
        match key {
            Key::Escape => self.hide(),
            Key::Down => self.activate(self.next_index(active)),
            Key::Up => self.activate(self.previous_index(active)),
            Key::Enter => match active {
                Some(i) => self.select(i),
                None => Transition::Unchanged,
            },
            Key::Tab => match active {
                Some(i) => self.select(i),
                None => self.hide(),
            },
        }
    }

    fn next_index(&self, active: Option<usize>) -> Option<usize> {
        let last = self.suggestions.len().checked_sub(1)?;
        match active {
            None => Some(0),
            Some(i) if i < last => Some(i + 1),
            Some(_) if self.policy.wrap => Some(0),
            Some(i) => Some(i),
        }
    }

    fn previous_index(&self, active: Option<usize>) -> Option<usize> {
        let last = self.suggestions.len().checked_sub(1)?;
        match active {
            Some(i) if i > 0 => Some(i - 1),
            Some(_) if self.policy.allow_free_text => None,
            Some(_) if self.policy.wrap => Some(last),
            Some(i) => Some(i),
            None if self.policy.wrap => Some(last),
            None => None,
        }
    }

    fn activate(&mut self, active: Option<usize>) -> Transition {
        let next = SelectionState::Visible { active };
        if self.state == next {
            return Transition::Unchanged;
        }
        self.state = next;
        Transition::Redraw
    }

    fn hide(&mut self) -> Transition {
        if self.is_visible() {
            self.state = SelectionState::Hidden;
            Transition::Hidden
        } else {
            Transition::Unchanged
        }
    }
}
