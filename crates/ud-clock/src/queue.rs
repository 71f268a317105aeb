//! `DelayedActionQueue` — min-ordered queue of one-shot delayed actions.
//!
//! # Why this exists
//!
//! Most agents are parked most minutes (at home, at work, between rounds).
//! Polling every behavior every minute to ask "is it your departure time
//! yet?" would cost O(N) per minute regardless of how many departures are
//! actually due.  The queue inverts the problem: a behavior registers the
//! minute at which it must act, and each clock step drains only the actions
//! due at that minute.
//!
//! # Ordering guarantees
//!
//! Actions drain in non-decreasing trigger order; actions sharing a trigger
//! instant drain in insertion order (`Vec` push order within the bucket).
//! Every action is one-shot: once drained it is gone.
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log W) insert and pop where W = number of distinct
//! trigger instants currently enqueued.  A population of commuters clusters
//! its departures into a few hundred distinct minutes per day, so the
//! constant is tiny.

use std::collections::BTreeMap;

use ud_core::SimInstant;

use crate::{ClockError, ClockResult};

/// A priority queue mapping simulated instants → actions due at that instant.
pub struct DelayedActionQueue<A> {
    inner: BTreeMap<SimInstant, Vec<A>>,
    /// Cached total action count for O(1) `len()`.
    total: usize,
}

impl<A> DelayedActionQueue<A> {
    pub fn new() -> Self {
        Self { inner: BTreeMap::new(), total: 0 }
    }

    /// Register a one-shot `action` firing at `trigger`.
    ///
    /// Callers resolving week times through
    /// [`Clock::instant_of`][crate::Clock::instant_of] cannot produce a past
    /// trigger; use [`schedule_checked`](Self::schedule_checked) when the
    /// trigger comes from absolute-instant arithmetic instead.
    pub fn schedule(&mut self, trigger: SimInstant, action: A) {
        self.inner.entry(trigger).or_default().push(action);
        self.total += 1;
    }

    /// Like [`schedule`](Self::schedule), but rejects a trigger that lies
    /// before `now` with [`ClockError::PastTrigger`].
    ///
    /// A trigger equal to `now` is accepted and fires on the current drain.
    pub fn schedule_checked(
        &mut self,
        now:     SimInstant,
        trigger: SimInstant,
        action:  A,
    ) -> ClockResult<()> {
        if trigger < now {
            return Err(ClockError::PastTrigger { trigger, now });
        }
        self.schedule(trigger, action);
        Ok(())
    }

    /// Remove and return every action whose trigger is `<= now`, in
    /// non-decreasing trigger order (insertion order within one instant).
    ///
    /// Returns an empty vec on the common minute where nothing is due.
    pub fn drain_due(&mut self, now: SimInstant) -> Vec<(SimInstant, A)> {
        let mut due = Vec::new();
        while let Some((&trigger, _)) = self.inner.first_key_value() {
            if trigger > now {
                break;
            }
            let actions = self.inner.remove(&trigger).unwrap_or_default();
            self.total -= actions.len();
            due.extend(actions.into_iter().map(|a| (trigger, a)));
        }
        due
    }

    /// The earliest trigger with at least one queued action, or `None` if
    /// the queue is empty.
    pub fn next_trigger(&self) -> Option<SimInstant> {
        self.inner.keys().next().copied()
    }

    /// Total number of pending actions across all future triggers.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl<A> Default for DelayedActionQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}
