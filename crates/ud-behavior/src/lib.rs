//! `ud-behavior` — driver behavior state machine and archetypes.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`action`] | `MoverAction`, `MoveEvent`, `BehaviorSignal`                 |
//! | [`body`]   | `AgentBody` — vehicle + location/parking state               |
//! | [`driver`] | `DriverBehavior`, `Archetype`, `RoundPlan`                   |
//! | [`engine`] | `MovementEngine` contract, `StraightLineEngine` placeholder  |
//! | [`error`]  | `BehaviorError`, `BehaviorResult<T>`                         |
//!
//! # Event loop contract
//!
//! A behavior exposes a mutable *next action* ([`MoverAction`]) read by the
//! movement engine each tick; the engine raises exactly three event kinds
//! back ([`MoveEvent`]).  Shared skeleton across archetypes:
//!
//! ```text
//! construction        → next = Enter(origin)
//! ParkingLeft         → next = Move
//! ParkingEntered      → next = Wait
//! DestinationReached  → archetype-specific: advance through the round,
//!                       pick the next Enter/Leave target, finalize the
//!                       round on the final return to origin.
//! ```
//!
//! Scheduled departures arrive from the clock via
//! [`DriverBehavior::on_departure`]; round lifecycle notifications flow back
//! to the caller as [`BehaviorSignal`]s (fire-and-forget).

pub mod action;
pub mod body;
pub mod driver;
pub mod engine;
pub mod error;


pub use action::{BehaviorSignal, MoveEvent, MoverAction};
pub use body::AgentBody;
pub use driver::{Archetype, DriverBehavior, RoundPlan, RoundStop};
pub use engine::{MovementEngine, StraightLineEngine};
pub use error::{BehaviorError, BehaviorResult};
