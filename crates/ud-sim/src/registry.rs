//! The round/termination registry.
//!
//! Invariant: the simulation is running iff the registry holds at least one
//! in-flight round.  `complete` removes an entry and, if the map just became
//! empty, reports [`Completion::ShutdownTriggered`] — exactly once per run,
//! no matter how many completions race for the honor.  All mutation happens
//! under one mutex, so independently-completing agents can call in from any
//! thread.

use std::collections::HashMap;
use std::sync::Mutex;

use ud_core::AgentId;

/// Result of a [`RoundRegistry::complete`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Other rounds are still in flight (count after this removal).
    RoundsRemaining(usize),
    /// This completion emptied the registry; the caller must stop the
    /// simulation.  Returned at most once per registry.
    ShutdownTriggered,
}

struct RegistryState {
    /// Agent → origin establishment of its active round.
    rounds: HashMap<AgentId, String>,
    shutdown_fired: bool,
}

/// Tracks every in-flight round and detects whole-simulation completion.
pub struct RoundRegistry {
    state: Mutex<RegistryState>,
}

impl RoundRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                rounds: HashMap::new(),
                shutdown_fired: false,
            }),
        }
    }

    /// Insert `agent`'s active round.  Called from the sequential
    /// registration phase only.
    pub fn register(&self, agent: AgentId, establishment: impl Into<String>) {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        state.rounds.insert(agent, establishment.into());
    }

    /// Remove `agent`'s round.  Safe to call concurrently; a completion that
    /// empties the registry triggers shutdown exactly once.
    pub fn complete(&self, agent: AgentId) -> Completion {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        state.rounds.remove(&agent);
        if state.rounds.is_empty() && !state.shutdown_fired {
            state.shutdown_fired = true;
            Completion::ShutdownTriggered
        } else {
            Completion::RoundsRemaining(state.rounds.len())
        }
    }

    /// Number of rounds still in flight.
    pub fn len(&self) -> usize {
        self.state.lock().expect("registry mutex poisoned").rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RoundRegistry {
    fn default() -> Self {
        Self::new()
    }
}
