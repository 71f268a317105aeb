//! The agent construction pipeline.
//!
//! One independent task per (establishment, vehicle) pair whose fleet slot
//! survived policy preprocessing.  Tasks read the shared establishment map
//! immutably and draw from a task-local RNG seeded from the agent id, so
//! archetype assignment is reproducible whether the pipeline runs on Rayon
//! (`parallel` feature) or sequentially.
//!
//! A task that fails — empty round, unroutable leg — is logged and dropped;
//! its siblings are unaffected.  Registration into the shared registry is
//! deliberately NOT part of this pipeline: the caller hands the returned
//! agents to [`Simulation::register_agents`][crate::Simulation::register_agents]
//! one at a time, after every task has joined.

use std::collections::BTreeMap;

use tracing::{info, warn};

use ud_behavior::{
    AgentBody, Archetype, BehaviorResult, DriverBehavior, MovementEngine, RoundPlan, RoundStop,
};
use ud_core::{AgentId, AgentRng, NodeId, SimConfig};
use ud_fleet::{Establishment, Personality};
use ud_spatial::RoadGraph;

// ── Output types ──────────────────────────────────────────────────────────────

/// One successfully constructed agent, ready for sequential registration.
pub struct BuiltAgent {
    pub id: AgentId,
    /// Origin establishment of the agent's round.
    pub establishment: String,
    pub vehicle: String,
    pub behavior: DriverBehavior,
    /// The task-local RNG, carried forward so departure-time draws continue
    /// the same per-agent stream.
    pub rng: AgentRng,
}

/// Aggregate counters for one construction run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstructionReport {
    pub built:   usize,
    /// Tasks abandoned on a per-agent error (logged, non-fatal).
    pub skipped: usize,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Build one agent per occupied fleet slot, concurrently under the
/// `parallel` feature.
///
/// Task order — and therefore agent id assignment — is deterministic:
/// establishments in id order, vehicles in id order within each.
pub fn build_agents<E: MovementEngine>(
    establishments: &BTreeMap<String, Establishment>,
    graph:          &RoadGraph,
    engine:         &E,
    config:         &SimConfig,
) -> (Vec<BuiltAgent>, ConstructionReport) {
    struct Task<'a> {
        id:            AgentId,
        establishment: &'a Establishment,
        vehicle_id:    &'a str,
    }

    let tasks: Vec<Task<'_>> = establishments
        .values()
        .flat_map(|establishment| {
            establishment
                .rounds
                .keys()
                // Vacated slots (mobility change) build no agent.
                .filter(|vehicle_id| establishment.fleet.contains_key(*vehicle_id))
                .map(move |vehicle_id| (establishment, vehicle_id.as_str()))
        })
        .enumerate()
        .map(|(i, (establishment, vehicle_id))| Task {
            id: AgentId(i as u32),
            establishment,
            vehicle_id,
        })
        .collect();

    let run_task = |task: &Task<'_>| -> BehaviorResult<BuiltAgent> {
        build_one(
            task.id,
            task.establishment,
            task.vehicle_id,
            establishments,
            graph,
            engine,
            config.seed,
        )
    };

    #[cfg(feature = "parallel")]
    let results: Vec<BehaviorResult<BuiltAgent>> = {
        use rayon::prelude::*;
        tasks.par_iter().map(run_task).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<BehaviorResult<BuiltAgent>> = tasks.iter().map(run_task).collect();

    // Per-task failures drop only that agent.
    let mut agents = Vec::with_capacity(results.len());
    let mut skipped = 0usize;
    for (task, result) in tasks.iter().zip(results) {
        match result {
            Ok(agent) => agents.push(agent),
            Err(e) => {
                skipped += 1;
                warn!(
                    agent = %task.id,
                    establishment = %task.establishment.id,
                    vehicle = task.vehicle_id,
                    error = %e,
                    "agent construction abandoned"
                );
            }
        }
    }

    let report = ConstructionReport { built: agents.len(), skipped };
    info!(built = report.built, skipped = report.skipped, "agent construction complete");
    (agents, report)
}

// ── One task ──────────────────────────────────────────────────────────────────

fn build_one(
    id:             AgentId,
    establishment:  &Establishment,
    vehicle_id:     &str,
    establishments: &BTreeMap<String, Establishment>,
    graph:          &RoadGraph,
    engine:         &impl MovementEngine,
    seed:           u64,
) -> BehaviorResult<BuiltAgent> {
    let mut rng = AgentRng::new(seed, id);

    let round = &establishment.rounds[vehicle_id];
    let vehicle = establishment.fleet[vehicle_id].clone();
    let plan = resolve_plan(establishment, round, establishments);

    let archetype = select_archetype(establishment, plan.stops.len(), &mut rng);
    let body = AgentBody::new(vehicle, plan.origin.node);
    let personality = establishment
        .personalities
        .get(vehicle_id)
        .cloned()
        .unwrap_or_else(|| Personality::new(establishment.activity, vehicle_id));

    let behavior = DriverBehavior::new(archetype, body, plan, personality)?;
    behavior.validate_route(engine, graph)?;

    Ok(BuiltAgent {
        id,
        establishment: establishment.id.clone(),
        vehicle: vehicle_id.to_string(),
        behavior,
        rng,
    })
}

/// Archetype selection policy:
///
/// - non-private activity → [`Archetype::DeliveryDriver`];
/// - private, fewer than 2 establishments → [`Archetype::WorkerHomeAtNoon`]
///   with probability ¼, [`Archetype::Worker`] otherwise;
/// - private, 2 or more → [`Archetype::WorkerOneActivity`].
fn select_archetype(
    establishment: &Establishment,
    stop_count:    usize,
    rng:           &mut AgentRng,
) -> Archetype {
    if !establishment.activity.is_private() {
        Archetype::DeliveryDriver
    } else if stop_count < 2 {
        if rng.gen_range(0u32..4) == 0 {
            Archetype::WorkerHomeAtNoon
        } else {
            Archetype::Worker
        }
    } else {
        Archetype::WorkerOneActivity
    }
}

/// Resolve a round's establishment ids to road nodes.
///
/// Unresolved establishments map to `NodeId::INVALID`, which
/// `validate_route` rejects as a route-construction failure.
fn resolve_plan(
    origin:         &Establishment,
    round:          &ud_fleet::Round,
    establishments: &BTreeMap<String, Establishment>,
) -> RoundPlan {
    let node_of = |id: &str| -> NodeId {
        establishments
            .get(id)
            .and_then(Establishment::resolved_node)
            .unwrap_or(NodeId::INVALID)
    };
    RoundPlan {
        origin: RoundStop {
            establishment: origin.id.clone(),
            node:          origin.resolved_node().unwrap_or(NodeId::INVALID),
        },
        stops: round
            .stops
            .iter()
            .map(|id| RoundStop { establishment: id.clone(), node: node_of(id) })
            .collect(),
        departure: round.departure,
    }
}
