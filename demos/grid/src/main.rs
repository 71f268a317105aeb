//! grid — smallest end-to-end demo of the rust_ud traffic simulation.
//!
//! Preprocesses a handful of establishments on a synthetic 5×5 grid,
//! constructs one agent per fleet vehicle, and runs the minute loop until
//! every round completes.

mod network;

use std::io::Cursor;

use anyhow::Result;
use tracing::info;

use ud_behavior::StraightLineEngine;
use ud_core::{AgentId, SimConfig, SimRng, SimTime, WeekDay};
use ud_fleet::{preprocess, RetrofitPolicy};
use ud_sim::{build_agents, RoundObserver, Simulation};
use ud_spatial::NoRepair;

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:         u64 = 42;
const HORIZON_DAYS: u32 = 2;

// ── Input data ────────────────────────────────────────────────────────────────

const ESTABLISHMENTS_CSV: &str = "\
id,name,activity,lat,lon
e1,Bakery Morel,retail,45.7551,4.8551
e2,Entrepot Part-Dieu,wholesale,45.7651,4.8651
e3,Mairie Annexe,office,45.7601,4.8601
h1,Rue Garibaldi 12,private_habitation,45.7501,4.8501
h2,Cours Lafayette 3,private_habitation,45.7701,4.8701
h3,Quai Augagneur 8,private_habitation,45.7551,4.8651
";

const FLEET_CSV: &str = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
e1,v1,van,euro3,monday,6,30,h1;h3;h2
e2,v1,light_truck,euro4,monday,5,45,e1;e3
e2,v2,van,euro6,monday,8,15,h2;h1
h1,v1,car,euro5,monday,7,0,e1
h2,v1,car,euro2,monday,7,0,e3;e1
h3,v1,car,euro6,monday,7,0,e3
";

// ── Observer ──────────────────────────────────────────────────────────────────

struct LogObserver;

impl RoundObserver for LogObserver {
    fn on_round_departure(&mut self, agent: AgentId, establishment: &str, time: SimTime) {
        info!(%agent, establishment, %time, "round departure");
    }
    fn on_round_end(&mut self, agent: AgentId, establishment: &str, satisfaction: f32, time: SimTime) {
        info!(%agent, establishment, satisfaction, %time, "round complete");
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let graph = build_network();
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "network built");

    let config = SimConfig {
        start:        SimTime::new(WeekDay::Monday, 0, 0),
        horizon_days: HORIZON_DAYS,
        seed:         SEED,
    };

    let (establishments, report) = preprocess(
        &graph,
        &mut NoRepair,
        Cursor::new(ESTABLISHMENTS_CSV),
        Cursor::new(FLEET_CSV),
        &RetrofitPolicy::default(),
        &mut SimRng::new(SEED),
    )?;
    info!(
        establishments = report.establishments,
        vehicles = report.vehicles,
        replaced = report.policy.replaced,
        mobility_changed = report.policy.mobility_changed,
        frauds = report.policy.frauds,
        "preprocessing complete"
    );

    let engine = StraightLineEngine::default();
    let (agents, construction) = build_agents(&establishments, &graph, &engine, &config);
    info!(built = construction.built, skipped = construction.skipped, "agents constructed");

    let mut sim = Simulation::new(config, graph, engine);
    sim.register_agents(agents)?;
    let summary = sim.run(&mut LogObserver)?;

    info!(
        rounds = summary.completed_rounds,
        final_time = %summary.final_time,
        horizon_reached = summary.horizon_reached,
        "done"
    );
    Ok(())
}
