//! Round lifecycle observer.
//!
//! The core publishes round-departure and round-end notifications as
//! fire-and-forget callbacks; transport and encoding toward a visualization
//! front-end are the observer implementation's concern.

use ud_core::{AgentId, SimTime};

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait RoundObserver {
    /// An agent left its parking on a scheduled departure.
    fn on_round_departure(&mut self, _agent: AgentId, _establishment: &str, _time: SimTime) {}

    /// An agent returned to its origin and completed its round.
    ///
    /// `satisfaction` is the value the agent's personality derived for this
    /// round, to be folded into the neighborhood aggregate.
    fn on_round_end(
        &mut self,
        _agent:         AgentId,
        _establishment: &str,
        _satisfaction:  f32,
        _time:          SimTime,
    ) {
    }

    /// Called once when the loop stops (registry drained or horizon hit).
    fn on_sim_end(&mut self, _time: SimTime) {}
}

/// A [`RoundObserver`] that does nothing.
pub struct NoopObserver;

impl RoundObserver for NoopObserver {}
