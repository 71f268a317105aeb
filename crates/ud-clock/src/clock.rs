//! The minute-stepping simulated clock.

use ud_core::{SimInstant, SimTime, MINUTES_PER_WEEK};

/// Tracks the current simulated minute and maps it back to week time.
///
/// The clock is advanced one minute at a time by the simulation loop; the
/// loop drains the delayed-action queue after each step.  `Clock` is cheap to
/// copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
pub struct Clock {
    /// Week time of instant 0.
    start: SimTime,
    /// The current minute — advanced by [`Clock::advance`] each iteration.
    now: SimInstant,
}

impl Clock {
    /// Create a clock positioned at `start` (instant 0).
    pub fn new(start: SimTime) -> Self {
        Self { start, now: SimInstant::ZERO }
    }

    /// The current absolute minute.
    #[inline]
    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// The current position within the simulated week.
    pub fn time(&self) -> SimTime {
        self.time_at(self.now)
    }

    /// Week time corresponding to an arbitrary `instant`.
    pub fn time_at(&self, instant: SimInstant) -> SimTime {
        let mow = (self.start.minute_of_week() as u64 + instant.0) % MINUTES_PER_WEEK as u64;
        SimTime::from_minute_of_week(mow as u32)
    }

    /// Advance the clock by one simulated minute.
    #[inline]
    pub fn advance(&mut self) {
        self.now = self.now + 1;
    }

    /// Resolve a week `time` to the first absolute instant at-or-after the
    /// current minute whose week position equals `time`.
    ///
    /// This is how scheduled departures stay well-defined across midnight and
    /// the week boundary: a target "Monday 07:12" requested on Sunday evening
    /// resolves into next week's Monday, and a target equal to the current
    /// week position resolves to *now* (fires on the current drain).
    pub fn instant_of(&self, time: SimTime) -> SimInstant {
        let now_mow = self.time().minute_of_week();
        let delta = (time.minute_of_week() + MINUTES_PER_WEEK - now_mow) % MINUTES_PER_WEEK;
        self.now + delta as u64
    }
}

impl std::fmt::Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.now, self.time())
    }
}
