//! "Selection settled" debounce.
//!
//! Hosts report every selection change with [`observe`]; once no new change
//! arrived for the configured delay, [`poll`] hands out the last observed
//! value exactly once. Time is always passed in, so the tracker never reads a
//! clock itself.
//!
//! [`observe`]: SelectionSettleTracker::observe
//! [`poll`]: SelectionSettleTracker::poll

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SelectionSettleTracker<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> SelectionSettleTracker<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a change at `now`, restarting the quiet period.
    pub fn observe(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// The settled value, if the quiet period is over at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let settled = self.pending.as_ref().is_some_and(|p| now >= p.deadline);
        if settled {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }

    /// When the pending value settles, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without firing.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!(target: "view.selection", "pending settle cancelled");
        }
    }
}

impl<T> Drop for SelectionSettleTracker<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
