//! `ud-fleet` — establishments, fleets, rounds, and the preprocessing pipeline.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`model`]       | `ActivityCategory`, `Vehicle`, `Round`, `Establishment`  |
//! | [`personality`] | `Personality` — journey-time accumulator + satisfaction  |
//! | [`loader`]      | CSV establishment/fleet loader                           |
//! | [`policy`]      | `PolicyEngine` contract, `NoPolicy`, `RetrofitPolicy`    |
//! | [`preprocess`]  | the sequential preprocessing pipeline                    |
//! | [`error`]       | `FleetError`, `FleetResult<T>`                           |
//!
//! # Pipeline order
//!
//! [`preprocess::preprocess`] runs once before agent construction:
//! dead-end scan + repair → data load (fatal on failure) → eligible-node
//! index → nearest-node resolution per establishment → one `Personality` per
//! (establishment, vehicle) → policy preprocessing with aggregate counters.

pub mod error;
pub mod loader;
pub mod model;
pub mod personality;
pub mod policy;
pub mod preprocess;

#[cfg(test)]
mod tests;

pub use error::{FleetError, FleetResult};
pub use loader::load_establishments;
pub use model::{ActivityCategory, EmissionNorm, Establishment, Round, Vehicle, VehicleKind};
pub use personality::Personality;
pub use policy::{NoPolicy, PolicyEngine, PolicyOutcome, RetrofitPolicy};
pub use preprocess::{preprocess, PreprocessReport};
