//! The `Simulation` struct and its minute loop.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use ud_behavior::{BehaviorSignal, DriverBehavior, MoveEvent, MovementEngine, MoverAction};
use ud_clock::{Clock, DelayedActionQueue};
use ud_core::{AgentId, NodeId, SimConfig, SimInstant, SimTime};
use ud_spatial::RoadGraph;

use crate::{BuiltAgent, Completion, RoundObserver, RoundRegistry, SimResult};

// ── Internal per-agent state ──────────────────────────────────────────────────

/// A scheduled departure waiting in the delayed-action queue.
struct DepartureAction {
    agent: AgentId,
}

/// Transit bookkeeping for one agent (teleport-at-arrival model; the real
/// physical motion lives in the external engine).
#[derive(Clone, Copy)]
struct MotionState {
    in_transit:  bool,
    destination: NodeId,
    arrival:     SimInstant,
}

impl MotionState {
    fn stationary() -> Self {
        Self { in_transit: false, destination: NodeId::INVALID, arrival: SimInstant::ZERO }
    }
}

struct AgentSlot {
    behavior: DriverBehavior,
    motion:   MotionState,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The single-threaded simulation runner.
///
/// Owns the clock, the delayed-action queue, every agent behavior, and the
/// round registry.  Each simulated minute it:
///
/// 1. drains due departure actions and dispatches them to their behaviors;
/// 2. steps the movement engine for every agent, in ascending `AgentId`
///    order, routing raised events back into the behaviors;
/// 3. forwards round-end signals to the registry and stops — exactly once —
///    when the registry empties.
pub struct Simulation<E: MovementEngine> {
    config:   SimConfig,
    clock:    Clock,
    queue:    DelayedActionQueue<DepartureAction>,
    graph:    RoadGraph,
    engine:   E,
    agents:   BTreeMap<AgentId, AgentSlot>,
    registry: RoundRegistry,

    completed_rounds: usize,
    shutdown:         bool,
}

/// What a finished run looked like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub final_instant:    SimInstant,
    pub final_time:       SimTime,
    pub completed_rounds: usize,
    /// `true` when the safety horizon stopped the run before the registry
    /// drained.
    pub horizon_reached: bool,
}

impl<E: MovementEngine> Simulation<E> {
    pub fn new(config: SimConfig, graph: RoadGraph, engine: E) -> Self {
        let clock = Clock::new(config.start);
        Self {
            config,
            clock,
            queue: DelayedActionQueue::new(),
            graph,
            engine,
            agents: BTreeMap::new(),
            registry: RoundRegistry::new(),
            completed_rounds: 0,
            shutdown: false,
        }
    }

    pub fn registry(&self) -> &RoundRegistry {
        &self.registry
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    // ── Registration (sequential, after construction joins) ──────────────

    /// Register built agents one at a time: insert each into the round
    /// registry and schedule its departures on the clock.
    ///
    /// Never call while construction tasks are still running — the pipeline
    /// in [`build_agents`][crate::build_agents] joins first precisely so
    /// this phase cannot race on the registry.
    pub fn register_agents(&mut self, agents: Vec<BuiltAgent>) -> SimResult<()> {
        for mut agent in agents {
            let times = agent
                .behavior
                .departure_times(&mut agent.rng, self.config.start.day);
            debug_assert_eq!(times.len(), agent.behavior.expected_departures());
            for time in times {
                let trigger = self.clock.instant_of(time);
                self.queue.schedule_checked(
                    self.clock.now(),
                    trigger,
                    DepartureAction { agent: agent.id },
                )?;
            }

            self.registry.register(agent.id, agent.establishment.clone());
            debug!(agent = %agent.id, establishment = %agent.establishment,
                   archetype = %agent.behavior.archetype(), "agent registered");
            self.agents.insert(agent.id, AgentSlot {
                behavior: agent.behavior,
                motion:   MotionState::stationary(),
            });
        }
        info!(agents = self.agents.len(), "registration complete");
        Ok(())
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Run until every round completes (or the safety horizon is hit).
    pub fn run<O: RoundObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let mut horizon_reached = false;

        while !self.shutdown && !self.agents.is_empty() {
            let now = self.clock.now();
            if now >= self.config.horizon() {
                warn!(%now, "safety horizon reached with rounds still in flight");
                horizon_reached = true;
                break;
            }

            // ── 1. Scheduled departures ───────────────────────────────────
            for (_, action) in self.queue.drain_due(now) {
                let Some(slot) = self.agents.get_mut(&action.agent) else {
                    continue;
                };
                let signals = slot.behavior.on_departure(now);
                self.dispatch(action.agent, signals, observer);
            }

            // ── 2. Movement engine step, ascending agent order ────────────
            let ids: Vec<AgentId> = self.agents.keys().copied().collect();
            for id in ids {
                let signals = self.step_agent(id, now);
                self.dispatch(id, signals, observer);
                if self.shutdown {
                    break;
                }
            }

            self.clock.advance();
        }

        let summary = RunSummary {
            final_instant:    self.clock.now(),
            final_time:       self.clock.time(),
            completed_rounds: self.completed_rounds,
            horizon_reached,
        };
        info!(rounds = summary.completed_rounds, time = %summary.final_time, "simulation ended");
        observer.on_sim_end(summary.final_time);
        Ok(summary)
    }

    /// Execute one engine tick for one agent: read its next action, perform
    /// it, and collect the events it raises.
    fn step_agent(&mut self, id: AgentId, now: SimInstant) -> Vec<BehaviorSignal> {
        let Self { agents, engine, graph, .. } = self;
        let Some(slot) = agents.get_mut(&id) else {
            return vec![];
        };

        match slot.behavior.next_action() {
            MoverAction::Wait => vec![],

            MoverAction::Enter(_node) => {
                slot.behavior.handle_event(MoveEvent::ParkingEntered, now)
            }

            MoverAction::Leave(from) => {
                let destination = slot.behavior.destination();
                match engine.route_minutes(graph, from, destination) {
                    Ok(minutes) => {
                        slot.motion = MotionState {
                            in_transit: true,
                            destination,
                            arrival: now + minutes as u64,
                        };
                        slot.behavior.handle_event(MoveEvent::ParkingLeft, now)
                    }
                    Err(e) => {
                        // Routes were validated at construction; a failure
                        // here means the graph changed under us.  Retire the
                        // agent so termination detection stays sound.
                        warn!(agent = %id, error = %e, "route failed mid-simulation; retiring agent");
                        agents.remove(&id);
                        vec![BehaviorSignal::RoundEnd { satisfaction: -1.0 }]
                    }
                }
            }

            MoverAction::Move => {
                if slot.motion.in_transit && now >= slot.motion.arrival {
                    slot.motion.in_transit = false;
                    slot.behavior.handle_event(MoveEvent::DestinationReached, now)
                } else {
                    vec![]
                }
            }
        }
    }

    /// Forward behavior signals to the observer and the round registry.
    fn dispatch<O: RoundObserver>(
        &mut self,
        agent:    AgentId,
        signals:  Vec<BehaviorSignal>,
        observer: &mut O,
    ) {
        for signal in signals {
            let establishment = self
                .agents
                .get(&agent)
                .map(|s| s.behavior.round().origin.establishment.clone())
                .unwrap_or_default();
            match signal {
                BehaviorSignal::RoundDeparture => {
                    observer.on_round_departure(agent, &establishment, self.clock.time());
                }
                BehaviorSignal::RoundEnd { satisfaction } => {
                    observer.on_round_end(agent, &establishment, satisfaction, self.clock.time());
                    self.completed_rounds += 1;
                    match self.registry.complete(agent) {
                        Completion::ShutdownTriggered => {
                            info!("all rounds complete; stopping simulation");
                            self.shutdown = true;
                        }
                        Completion::RoundsRemaining(n) => {
                            info!(remaining = n, "rounds still ongoing");
                        }
                    }
                }
            }
        }
    }
}
