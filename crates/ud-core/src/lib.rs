//! `ud-core` — foundational types for the `rust_ud` urban traffic simulation.
//!
//! This crate is a dependency of every other `ud-*` crate.  It intentionally
//! has no `ud-*` dependencies and minimal external ones (only `rand`).
//!
//! # What lives here
//!
//! | Module   | Contents                                               |
//! |----------|--------------------------------------------------------|
//! | [`ids`]  | `AgentId`, `NodeId`                                    |
//! | [`geo`]  | `GeoPoint`, haversine distance                         |
//! | [`time`] | `WeekDay`, `SimTime`, `SimInstant`, `SimConfig`        |
//! | [`rng`]  | `AgentRng` (per-agent), `SimRng` (pipeline-level)      |

pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::GeoPoint;
pub use ids::{AgentId, NodeId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimConfig, SimInstant, SimTime, WeekDay, MINUTES_PER_DAY, MINUTES_PER_WEEK};
