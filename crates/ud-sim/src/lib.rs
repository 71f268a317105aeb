//! `ud-sim` — round registry, agent construction, and the simulation loop.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`registry`] | `RoundRegistry` — in-flight rounds + termination detection |
//! | [`build`]    | the (optionally parallel) agent construction pipeline     |
//! | [`sim`]      | `Simulation` — the single-threaded minute loop            |
//! | [`observer`] | `RoundObserver` callbacks, `NoopObserver`                 |
//! | [`error`]    | `SimError`, `SimResult<T>`                                |
//!
//! # Phases
//!
//! 1. **Construction** (the only parallel phase): one task per surviving
//!    (establishment, vehicle) pair builds a body + behavior; tasks never
//!    touch shared state.  See [`build::build_agents`].
//! 2. **Registration** (sequential, deterministic order): each built agent
//!    is inserted into the [`RoundRegistry`] and its departures are
//!    scheduled on the clock.
//! 3. **Run** (single-threaded): every simulated minute, due departures are
//!    drained and dispatched, then the movement engine steps each agent;
//!    round-end events drain the registry, and registry emptiness stops the
//!    loop exactly once.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the construction pipeline on Rayon's thread pool. |

pub mod build;
pub mod error;
pub mod observer;
pub mod registry;
pub mod sim;

#[cfg(test)]
mod tests;

pub use build::{build_agents, BuiltAgent, ConstructionReport};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, RoundObserver};
pub use registry::{Completion, RoundRegistry};
pub use sim::{RunSummary, Simulation};
