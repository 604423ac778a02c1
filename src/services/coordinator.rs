//! Ownership of the single in-flight lookup and the single debounce timer.
//!
//! The coordinator never talks to the transport. It hands out tokens,
//! remembers which one is current and which lookup is waiting for its
//! debounce deadline. Staleness is decided purely by token comparison.

use crate::transport::CancelHandle;
use crate::types::{Params, RequestToken};
use std::time::{Duration, Instant};

/// A lookup that has been sent and not yet answered.
#[derive(Debug)]
pub struct InFlight {
    pub token: RequestToken,
    pub query: String,
    pub params: Params,
    cancel: CancelHandle,
}

/// A lookup waiting for its debounce deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub query: String,
    pub params: Params,
    pub deadline: Instant,
}

#[derive(Debug, Default)]
pub struct RequestCoordinator {
    last_issued: RequestToken,
    in_flight: Option<InFlight>,
    pending: Option<PendingLookup>,
    delay: Duration,
}

impl RequestCoordinator {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Whether lookups go through the debounce timer.
    #[must_use]
    pub fn is_debounced(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Assigns the next token to a lookup for `query`.
    ///
    /// The previous in-flight lookup, if any, is superseded and cancelled.
    pub fn issue(&mut self, query: &str, params: &Params) -> RequestToken {
        self.abandon_in_flight();
        self.last_issued = self.last_issued.next();
        self.in_flight = Some(InFlight {
            token: self.last_issued,
            query: query.to_string(),
            params: params.clone(),
            cancel: CancelHandle::noop(),
        });
        self.last_issued
    }

    /// Stores the transport's cancel handle for `token`.
    ///
    /// Handles for superseded tokens are cancelled right away.
    pub fn attach_cancel(&mut self, token: RequestToken, cancel: CancelHandle) {
        match self.in_flight.as_mut() {
            Some(flight) if flight.token == token => flight.cancel = cancel,
            _ => cancel.cancel(),
        }
    }

    /// Whether a response carrying `token` may still be applied.
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.token == token)
    }

    /// Takes the in-flight lookup if `token` is current, `None` if stale.
    pub fn complete(&mut self, token: RequestToken) -> Option<InFlight> {
        if self.is_current(token) {
            self.in_flight.take()
        } else {
            None
        }
    }

    /// Most recently issued token.
    #[must_use]
    pub fn last_issued(&self) -> Option<RequestToken> {
        (self.last_issued.as_u64() > 0).then_some(self.last_issued)
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    /// Schedules `query` to be issued once the debounce window has passed.
    ///
    /// Replaces any earlier pending lookup; returns the new deadline.
    pub fn defer(&mut self, query: &str, params: &Params, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.pending = Some(PendingLookup {
            query: query.to_string(),
            params: params.clone(),
            deadline,
        });
        deadline
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingLookup> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether `(query, params)` is already in flight or waiting to be issued.
    #[must_use]
    pub fn is_outstanding(&self, query: &str, params: &Params) -> bool {
        let in_flight = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.query == query && f.params == *params);
        let pending = self
            .pending
            .as_ref()
            .is_some_and(|p| p.query == query && p.params == *params);
        in_flight || pending
    }

    /// Removes and returns the pending lookup if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingLookup> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Drops the pending lookup, if any.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Marks the in-flight lookup as superseded so its answer is ignored.
    pub fn abandon_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            tracing::debug!("Superseding in-flight lookup {} for {:?}", flight.token, flight.query);
            flight.cancel.cancel();
        }
    }

    /// Drops both the pending and the in-flight lookup.
    pub fn reset(&mut self) {
        self.clear_pending();
        self.abandon_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_tokens_increase_and_supersede() {
        let mut coordinator = RequestCoordinator::default();
        let p = Params::new();
        let first = coordinator.issue("a", &p);
        let second = coordinator.issue("ab", &p);

        assert!(second > first);
        assert!(!coordinator.is_current(first));
        assert!(coordinator.is_current(second));
        assert!(coordinator.complete(first).is_none());

        let flight = coordinator.complete(second).unwrap();
        assert_eq!(flight.query, "ab");
        assert!(coordinator.complete(second).is_none(), "completes once");
        assert_eq!(coordinator.last_issued(), Some(second));
    }

    #[test]
    fn test_superseded_request_is_cancelled() {
        let cancels = Arc::new(AtomicUsize::new(0));
        let mut coordinator = RequestCoordinator::default();
        let p = Params::new();

        let first = coordinator.issue("a", &p);
        let counter = Arc::clone(&cancels);
        coordinator.attach_cancel(first, CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        coordinator.issue("ab", &p);
        assert_eq!(cancels.load(Ordering::SeqCst), 1);

        // A late handle for a stale token is cancelled immediately.
        let counter = Arc::clone(&cancels);
        coordinator.attach_cancel(first, CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(cancels.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_defer_replaces_pending() {
        let mut coordinator = RequestCoordinator::new(Duration::from_millis(100));
        let p = Params::new();
        let t0 = Instant::now();

        coordinator.defer("J", &p, t0);
        let deadline = coordinator.defer("Ja", &p, t0 + Duration::from_millis(50));
        assert_eq!(deadline, t0 + Duration::from_millis(150));

        assert!(coordinator.take_due(t0 + Duration::from_millis(120)).is_none());
        let due = coordinator.take_due(t0 + Duration::from_millis(150)).unwrap();
        assert_eq!(due.query, "Ja");
        assert!(coordinator.pending().is_none());
    }

    #[test]
    fn test_outstanding_matches_query_and_params() {
        let mut coordinator = RequestCoordinator::new(Duration::from_millis(10));
        let p = Params::new();
        let mut other = Params::new();
        other.insert("k".into(), "v".into());

        coordinator.issue("a", &p);
        assert!(coordinator.is_outstanding("a", &p));
        assert!(!coordinator.is_outstanding("a", &other));
        assert!(!coordinator.is_outstanding("ab", &p));

        coordinator.defer("ab", &p, Instant::now());
        assert!(coordinator.is_outstanding("ab", &p));

        coordinator.reset();
        assert!(!coordinator.is_outstanding("a", &p));
    }

    #[test]
    fn test_reset_drops_everything() {
        let mut coordinator = RequestCoordinator::new(Duration::from_millis(10));
        let p = Params::new();
        let token = coordinator.issue("a", &p);
        coordinator.defer("ab", &p, Instant::now());
        coordinator.reset();

        assert!(!coordinator.is_current(token));
        assert!(coordinator.pending_deadline().is_none());
        assert!(coordinator.in_flight().is_none());
    }
}
