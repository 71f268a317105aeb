//! Integration tests for ud-sim.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ud_behavior::{
    AgentBody, Archetype, DriverBehavior, RoundPlan, RoundStop, StraightLineEngine,
};
use ud_core::{AgentId, AgentRng, GeoPoint, NodeId, SimConfig, SimRng, SimTime, WeekDay};
use ud_fleet::{
    preprocess, ActivityCategory, EmissionNorm, Establishment, NoPolicy, Personality, Vehicle,
    VehicleKind,
};
use ud_spatial::{NoRepair, RoadClass, RoadGraph, RoadGraphBuilder};

use crate::{build_agents, BuiltAgent, Completion, RoundObserver, RoundRegistry, Simulation};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Three residential nodes in a line plus a forbidden motorway node sitting
/// right next to e1's location.
fn test_graph() -> RoadGraph {
    let mut b = RoadGraphBuilder::new();
    let n0 = b.add_node(GeoPoint::new(45.750, 4.850), RoadClass::Residential);
    let n1 = b.add_node(GeoPoint::new(45.760, 4.850), RoadClass::Residential);
    let n2 = b.add_node(GeoPoint::new(45.770, 4.850), RoadClass::Residential);
    let m = b.add_node(GeoPoint::new(45.7601, 4.8501), RoadClass::Motorway);
    b.add_road(n0, n1);
    b.add_road(n1, n2);
    b.add_road(n1, m);
    b.build()
}

const ESTABLISHMENTS_CSV: &str = "\
id,name,activity,lat,lon
e1,Bakery Morel,retail,45.7601,4.8501
e2,Mairie Annexe,office,45.7702,4.8502
h1,Rue Garibaldi 12,private_habitation,45.7501,4.8501
h2,Cours Lafayette 3,private_habitation,45.7701,4.8501
";

const FLEET_CSV: &str = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
e1,v1,van,euro4,monday,6,30,h1;h2
h1,v1,car,euro5,monday,7,0,e1
h2,v1,car,euro5,monday,7,0,e1;e2
";

fn test_config(seed: u64) -> SimConfig {
    SimConfig {
        start:        SimTime::new(WeekDay::Monday, 0, 0),
        horizon_days: 2,
        seed,
    }
}

fn preprocessed(seed: u64) -> std::collections::BTreeMap<String, Establishment> {
    let (map, _) = preprocess(
        &test_graph(),
        &mut NoRepair,
        Cursor::new(ESTABLISHMENTS_CSV),
        Cursor::new(FLEET_CSV),
        &NoPolicy,
        &mut SimRng::new(seed),
    )
    .unwrap();
    map
}

/// Observer that records every callback.
#[derive(Default)]
struct Recorder {
    departures: Vec<(AgentId, SimTime)>,
    ends:       Vec<(AgentId, String, f32, SimTime)>,
    sim_ends:   usize,
}

impl RoundObserver for Recorder {
    fn on_round_departure(&mut self, agent: AgentId, _establishment: &str, time: SimTime) {
        self.departures.push((agent, time));
    }
    fn on_round_end(&mut self, agent: AgentId, establishment: &str, satisfaction: f32, time: SimTime) {
        self.ends.push((agent, establishment.to_string(), satisfaction, time));
    }
    fn on_sim_end(&mut self, _time: SimTime) {
        self.sim_ends += 1;
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn shutdown_fires_exactly_once_sequentially() {
        let registry = RoundRegistry::new();
        registry.register(AgentId(0), "e1");
        registry.register(AgentId(1), "e1");
        registry.register(AgentId(2), "h1");

        assert_eq!(registry.complete(AgentId(1)), Completion::RoundsRemaining(2));
        assert_eq!(registry.complete(AgentId(0)), Completion::RoundsRemaining(1));
        assert_eq!(registry.complete(AgentId(2)), Completion::ShutdownTriggered);
        // A stray duplicate completion never re-triggers.
        assert_eq!(registry.complete(AgentId(2)), Completion::RoundsRemaining(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_completions_trigger_shutdown_once() {
        const THREADS: u32 = 8;
        const PER_THREAD: u32 = 16;

        let registry = Arc::new(RoundRegistry::new());
        for i in 0..THREADS * PER_THREAD {
            registry.register(AgentId(i), "e1");
        }

        let triggers = Arc::new(AtomicUsize::new(0));
        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let registry = Arc::clone(&registry);
                let triggers = Arc::clone(&triggers);
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        let agent = AgentId(t * PER_THREAD + i);
                        if registry.complete(agent) == Completion::ShutdownTriggered {
                            triggers.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(triggers.load(Ordering::SeqCst), 1, "shutdown must fire exactly once");
        assert!(registry.is_empty(), "no entry may be lost");
    }
}

// ── Construction pipeline ─────────────────────────────────────────────────────

#[cfg(test)]
mod build_tests {
    use super::*;

    #[test]
    fn archetype_selection_policy() {
        let establishments = preprocessed(42);
        let graph = test_graph();
        let (agents, report) = build_agents(
            &establishments,
            &graph,
            &StraightLineEngine::default(),
            &test_config(42),
        );
        assert_eq!(report.built, 3);
        assert_eq!(report.skipped, 0);

        // BTreeMap order: e1 → 0, h1 → 1, h2 → 2.
        assert_eq!(agents[0].establishment, "e1");
        assert_eq!(agents[0].behavior.archetype(), Archetype::DeliveryDriver);
        assert!(matches!(
            agents[1].behavior.archetype(),
            Archetype::Worker | Archetype::WorkerHomeAtNoon
        ));
        assert_eq!(agents[2].behavior.archetype(), Archetype::WorkerOneActivity);
    }

    #[test]
    fn construction_is_deterministic_for_a_seed() {
        let establishments = preprocessed(7);
        let graph = test_graph();
        let engine = StraightLineEngine::default();
        let (a, _) = build_agents(&establishments, &graph, &engine, &test_config(7));
        let (b, _) = build_agents(&establishments, &graph, &engine, &test_config(7));
        let types_a: Vec<_> = a.iter().map(|x| x.behavior.archetype()).collect();
        let types_b: Vec<_> = b.iter().map(|x| x.behavior.archetype()).collect();
        assert_eq!(types_a, types_b);
    }

    #[test]
    fn both_private_variants_appear_across_seeds() {
        let establishments = preprocessed(1);
        let graph = test_graph();
        let engine = StraightLineEngine::default();

        let mut saw_worker = false;
        let mut saw_home_at_noon = false;
        for seed in 0..64 {
            let (agents, _) = build_agents(&establishments, &graph, &engine, &test_config(seed));
            match agents[1].behavior.archetype() {
                Archetype::Worker => saw_worker = true,
                Archetype::WorkerHomeAtNoon => saw_home_at_noon = true,
                other => panic!("unexpected archetype {other} for single-stop private agent"),
            }
        }
        assert!(saw_worker, "p=3/4 branch never taken in 64 seeds");
        assert!(saw_home_at_noon, "p=1/4 branch never taken in 64 seeds");
    }

    #[test]
    fn failed_task_is_skipped_without_failing_the_batch() {
        // Two private establishments; only one gets a resolved node, so the
        // other's route validation fails.
        let mut establishments = std::collections::BTreeMap::new();

        let mut good = Establishment::new(
            "h1".into(),
            "Good".into(),
            ActivityCategory::PrivateHabitation,
            GeoPoint::new(45.750, 4.850),
        );
        good.set_resolved_node(NodeId(0));
        let mut bad = Establishment::new(
            "h9".into(),
            "Unresolved".into(),
            ActivityCategory::PrivateHabitation,
            GeoPoint::new(45.770, 4.850),
        );
        for e in [&mut good, &mut bad] {
            e.fleet.insert("v1".into(), Vehicle {
                id:   "v1".into(),
                kind: VehicleKind::Car,
                norm: EmissionNorm::Euro5,
            });
            e.rounds.insert("v1".into(), ud_fleet::Round {
                origin:    e.id.clone(),
                stops:     vec!["h1".into()],
                departure: SimTime::new(WeekDay::Monday, 7, 0),
            });
        }
        establishments.insert("h1".into(), good);
        establishments.insert("h9".into(), bad);

        let graph = test_graph();
        let (agents, report) = build_agents(
            &establishments,
            &graph,
            &StraightLineEngine::default(),
            &test_config(3),
        );
        assert_eq!(report.built, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(agents[0].establishment, "h1");
    }

    #[test]
    fn vacated_fleet_slot_builds_no_agent() {
        let mut establishments = preprocessed(5);
        establishments.get_mut("h1").unwrap().fleet.clear();
        let graph = test_graph();
        let (agents, report) = build_agents(
            &establishments,
            &graph,
            &StraightLineEngine::default(),
            &test_config(5),
        );
        assert_eq!(report.built, 2);
        assert!(agents.iter().all(|a| a.establishment != "h1"));
    }
}

// ── End-to-end runs ───────────────────────────────────────────────────────────

#[cfg(test)]
mod e2e_tests {
    use super::*;

    /// Hand-built Worker agent: one habitation, one workplace, forced to the
    /// p=¾ branch by constructing the archetype directly.
    fn worker_agent(id: AgentId, seed: u64) -> BuiltAgent {
        let round = RoundPlan {
            origin: RoundStop { establishment: "h1".into(), node: NodeId(0) },
            stops:  vec![RoundStop { establishment: "e1".into(), node: NodeId(1) }],
            departure: SimTime::new(WeekDay::Monday, 7, 0),
        };
        let body = AgentBody::new(
            Vehicle { id: "v1".into(), kind: VehicleKind::Car, norm: EmissionNorm::Euro5 },
            round.origin.node,
        );
        let personality = Personality::new(ActivityCategory::PrivateHabitation, "v1");
        let behavior = DriverBehavior::new(Archetype::Worker, body, round, personality).unwrap();
        BuiltAgent {
            id,
            establishment: "h1".into(),
            vehicle: "v1".into(),
            behavior,
            rng: AgentRng::new(seed, id),
        }
    }

    #[test]
    fn worker_commutes_morning_and_evening_then_registry_drains() {
        let mut sim = Simulation::new(
            test_config(42),
            test_graph(),
            StraightLineEngine::default(),
        );
        sim.register_agents(vec![worker_agent(AgentId(0), 42)]).unwrap();
        assert_eq!(sim.registry().len(), 1);

        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        // Two departures: one in each window, morning first.
        assert_eq!(rec.departures.len(), 2);
        let (_, morning) = rec.departures[0];
        let (_, evening) = rec.departures[1];
        assert!((7..=8).contains(&morning.hour), "morning departure at {morning}");
        assert!((16..=18).contains(&evening.hour), "evening departure at {evening}");

        // One round end; both legs are 3 minutes on this graph, so the
        // accumulated journey keeps satisfaction near the optimum.
        assert_eq!(rec.ends.len(), 1);
        let (agent, establishment, satisfaction, end_time) = &rec.ends[0];
        assert_eq!(*agent, AgentId(0));
        assert_eq!(establishment, "h1");
        assert!(*satisfaction > 0.9, "6 travel minutes should satisfy, got {satisfaction}");
        assert!(end_time > &evening, "round ended at {end_time}, after the {evening} departure");

        assert!(sim.registry().is_empty());
        assert_eq!(summary.completed_rounds, 1);
        assert!(!summary.horizon_reached);
        assert_eq!(rec.sim_ends, 1);
    }

    #[test]
    fn full_pipeline_runs_every_round_to_completion() {
        let establishments = preprocessed(11);
        let graph = test_graph();
        let engine = StraightLineEngine::default();
        let config = test_config(11);

        let (agents, report) = build_agents(&establishments, &graph, &engine, &config);
        assert_eq!(report.skipped, 0);
        let built = report.built;

        let mut sim = Simulation::new(config, graph, engine);
        sim.register_agents(agents).unwrap();

        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        assert_eq!(summary.completed_rounds, built);
        assert!(!summary.horizon_reached);
        assert!(sim.registry().is_empty());
        assert_eq!(rec.ends.len(), built);
        assert_eq!(rec.sim_ends, 1);
    }

    #[test]
    fn delivery_driver_departs_at_the_loaded_time() {
        let establishments = preprocessed(13);
        let graph = test_graph();
        let engine = StraightLineEngine::default();
        let config = test_config(13);
        let (agents, _) = build_agents(&establishments, &graph, &engine, &config);

        let delivery_id = agents
            .iter()
            .find(|a| a.behavior.archetype() == Archetype::DeliveryDriver)
            .map(|a| a.id)
            .expect("fixture has one delivery fleet");

        let mut sim = Simulation::new(config, graph, engine);
        sim.register_agents(agents).unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let times: Vec<SimTime> = rec
            .departures
            .iter()
            .filter(|(a, _)| *a == delivery_id)
            .map(|&(_, t)| t)
            .collect();
        assert_eq!(times, vec![SimTime::new(WeekDay::Monday, 6, 30)]);
    }

    #[test]
    fn commuter_departures_stay_inside_their_windows() {
        let establishments = preprocessed(17);
        let graph = test_graph();
        let engine = StraightLineEngine::default();
        let config = test_config(17);
        let (agents, _) = build_agents(&establishments, &graph, &engine, &config);

        // h1/v1 is the single-stop private agent (id 1 in BTreeMap order).
        let commuter = AgentId(1);

        let mut sim = Simulation::new(config, graph, engine);
        sim.register_agents(agents).unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let times: Vec<SimTime> = rec
            .departures
            .iter()
            .filter(|(a, _)| *a == commuter)
            .map(|&(_, t)| t)
            .collect();
        // Worker: morning + evening.  WorkerHomeAtNoon: those plus the noon
        // pair at 11:xx and 13:xx.
        assert!(times.len() == 2 || times.len() == 4, "got {times:?}");
        for t in &times {
            assert!(
                (7..=8).contains(&t.hour)
                    || t.hour == 11
                    || t.hour == 13
                    || (16..=18).contains(&t.hour),
                "departure outside every window: {t}"
            );
        }
    }

    #[test]
    fn empty_population_ends_immediately() {
        let mut sim = Simulation::new(
            test_config(1),
            test_graph(),
            StraightLineEngine::default(),
        );
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();
        assert_eq!(summary.completed_rounds, 0);
        assert_eq!(summary.final_instant.0, 0);
    }
}
