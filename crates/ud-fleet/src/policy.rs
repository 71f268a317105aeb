//! Fleet policy contract.
//!
//! A policy engine inspects each establishment after loading and may mutate
//! its fleet: replace a non-compliant vehicle, vacate the slot entirely (the
//! owner switches to another mobility and builds no agent), or record a
//! fraud (the owner keeps driving the non-compliant vehicle).  The engine's
//! internals — zone geometry, compliance rules — live outside this crate;
//! only the per-establishment counters cross the boundary.

use ud_core::SimRng;

use crate::{EmissionNorm, Establishment};

// ── PolicyOutcome ─────────────────────────────────────────────────────────────

/// Per-establishment counters returned by one `preprocess` call, aggregated
/// process-wide by the preprocessing pipeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Vehicles swapped for a compliant model.
    pub replaced: u32,
    /// Fleet slots vacated because the owner changed mobility.
    pub mobility_changed: u32,
    /// Owners keeping a non-compliant vehicle anyway.
    pub frauds: u32,
}

impl std::ops::AddAssign for PolicyOutcome {
    fn add_assign(&mut self, rhs: PolicyOutcome) {
        self.replaced += rhs.replaced;
        self.mobility_changed += rhs.mobility_changed;
        self.frauds += rhs.frauds;
    }
}

// ── PolicyEngine ──────────────────────────────────────────────────────────────

/// External policy engine invoked once per establishment during
/// preprocessing.
pub trait PolicyEngine {
    fn preprocess(&self, establishment: &mut Establishment, rng: &mut SimRng) -> PolicyOutcome;
}

/// A [`PolicyEngine`] that leaves every fleet untouched.
pub struct NoPolicy;

impl PolicyEngine for NoPolicy {
    fn preprocess(&self, _establishment: &mut Establishment, _rng: &mut SimRng) -> PolicyOutcome {
        PolicyOutcome::default()
    }
}

// ── RetrofitPolicy ────────────────────────────────────────────────────────────

/// Reference policy: every vehicle below `min_norm` either frauds, drops out
/// of the fleet (mobility change), or is retrofitted to `min_norm`.
pub struct RetrofitPolicy {
    /// Lowest emission norm tolerated inside the zone.
    pub min_norm: EmissionNorm,
    /// Probability that a non-compliant owner frauds instead of complying.
    pub fraud_probability: f64,
    /// Probability (after the fraud draw) that the owner gives up the
    /// vehicle rather than replace it.
    pub mobility_probability: f64,
}

impl Default for RetrofitPolicy {
    fn default() -> Self {
        Self {
            min_norm:             EmissionNorm::Euro5,
            fraud_probability:    0.05,
            mobility_probability: 0.10,
        }
    }
}

impl PolicyEngine for RetrofitPolicy {
    fn preprocess(&self, establishment: &mut Establishment, rng: &mut SimRng) -> PolicyOutcome {
        let mut outcome = PolicyOutcome::default();

        let non_compliant: Vec<String> = establishment
            .fleet
            .iter()
            .filter(|(_, v)| v.norm < self.min_norm)
            .map(|(id, _)| id.clone())
            .collect();

        for vehicle_id in non_compliant {
            if rng.gen_bool(self.fraud_probability) {
                outcome.frauds += 1;
            } else if rng.gen_bool(self.mobility_probability) {
                establishment.fleet.remove(&vehicle_id);
                outcome.mobility_changed += 1;
            } else {
                // Vehicle slot stays occupied; only the norm changes.
                if let Some(vehicle) = establishment.fleet.get_mut(&vehicle_id) {
                    vehicle.norm = self.min_norm;
                }
                outcome.replaced += 1;
            }
        }

        outcome
    }
}
