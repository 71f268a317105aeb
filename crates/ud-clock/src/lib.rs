//! `ud-clock` — simulated clock and one-shot delayed-action scheduler.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`clock`] | `Clock` — minute-stepping clock over the simulated week   |
//! | [`queue`] | `DelayedActionQueue<A>` — min-ordered one-shot actions    |
//! | [`error`] | `ClockError`, `ClockResult<T>`                            |
//!
//! # Design notes
//!
//! The queue stores opaque action *payloads* rather than closures; the
//! simulation loop drains due payloads each minute and dispatches them to the
//! owning behaviors.  Callbacks are short and run to completion, so no
//! suspension machinery is needed.
//!
//! Scheduling by week time ([`Clock::instant_of`]) always resolves to the
//! next occurrence at-or-after the current minute and therefore cannot land
//! in the past.  Scheduling by absolute instant goes through
//! [`DelayedActionQueue::schedule_checked`], which **rejects** past triggers
//! with [`ClockError::PastTrigger`] — never silently drops them.

pub mod clock;
pub mod error;
pub mod queue;


pub use clock::Clock;
pub use error::{ClockError, ClockResult};
pub use queue::DelayedActionQueue;
