//! The sequential preprocessing pipeline.
//!
//! Runs exactly once before agent construction:
//!
//! 1. Scan the road graph for dead ends and hand them to the external repair
//!    routine.
//! 2. Load establishments and fleets (fatal on malformed or empty input).
//! 3. Build the spatial index over delivery-eligible nodes.
//! 4. Resolve every establishment to its nearest eligible node (set once).
//! 5. Create one `Personality` per (establishment, vehicle) pair.
//! 6. Apply the policy engine per establishment; aggregate the
//!    replaced / mobility-changed / fraud counters process-wide.

use std::collections::BTreeMap;
use std::io::Read;

use tracing::{debug, info};

use ud_core::SimRng;
use ud_spatial::{DeadEndRepair, NodeIndex, RoadGraph};

use crate::{
    load_establishments, Establishment, FleetError, FleetResult, Personality, PolicyEngine,
    PolicyOutcome,
};

// ── PreprocessReport ──────────────────────────────────────────────────────────

/// Process-wide counters produced by one [`preprocess`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Dead-end nodes found in the road graph (before repair).
    pub dead_ends: usize,
    /// Establishments loaded and resolved.
    pub establishments: usize,
    /// Fleet vehicles remaining after policy preprocessing.
    pub vehicles: usize,
    /// Aggregated policy counters.
    pub policy: PolicyOutcome,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Run the preprocessing pipeline.  See the module docs for the step order.
///
/// # Errors
///
/// Any data-load failure is fatal: the caller gets `Err` and no partial
/// establishment map.  A graph without eligible nodes fails with
/// [`FleetError::NoEligibleNodes`] before any establishment is resolved.
pub fn preprocess<R1, R2, D, P>(
    graph:              &RoadGraph,
    repair:             &mut D,
    establishments_src: R1,
    fleet_src:          R2,
    policy:             &P,
    rng:                &mut SimRng,
) -> FleetResult<(BTreeMap<String, Establishment>, PreprocessReport)>
where
    R1: Read,
    R2: Read,
    D:  DeadEndRepair,
    P:  PolicyEngine,
{
    // ── 1. Dead-end scan + repair ─────────────────────────────────────────
    let dead_ends = graph.dead_ends();
    for node in &dead_ends {
        debug!(node = %node, "dead end found");
    }
    info!(count = dead_ends.len(), "dead-end scan complete");
    repair.repair(graph, &dead_ends);

    // ── 2. Load establishments and fleets ─────────────────────────────────
    let mut establishments = load_establishments(establishments_src, fleet_src)?;
    info!(count = establishments.len(), "establishments loaded");

    // ── 3. Eligible-node index ────────────────────────────────────────────
    let index = NodeIndex::eligible(graph);
    if index.is_empty() {
        return Err(FleetError::NoEligibleNodes);
    }
    debug!(eligible = index.len(), total = graph.node_count(), "spatial index built");

    // ── 4 + 5. Resolve nodes, create personalities ────────────────────────
    info!("resolving the closest eligible node of each establishment");
    for establishment in establishments.values_mut() {
        let node = index
            .nearest_node(establishment.location)
            .ok_or(FleetError::NoEligibleNodes)?;
        establishment.set_resolved_node(node);

        let activity = establishment.activity;
        let vehicle_ids: Vec<String> = establishment.rounds.keys().cloned().collect();
        for vehicle_id in vehicle_ids {
            establishment
                .personalities
                .insert(vehicle_id.clone(), Personality::new(activity, vehicle_id));
        }
    }

    // ── 6. Policy preprocessing ───────────────────────────────────────────
    let mut totals = PolicyOutcome::default();
    for establishment in establishments.values_mut() {
        totals += policy.preprocess(establishment, rng);
    }
    info!(replaced = totals.replaced, "total vehicles replaced");
    info!(mobility_changed = totals.mobility_changed, "total mobility changes");
    info!(frauds = totals.frauds, "total owners who chose to fraud");

    let vehicles = establishments.values().map(|e| e.fleet.len()).sum();
    let report = PreprocessReport {
        dead_ends: dead_ends.len(),
        establishments: establishments.len(),
        vehicles,
        policy: totals,
    };
    Ok((establishments, report))
}
