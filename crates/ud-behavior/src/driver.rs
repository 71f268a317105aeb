//! The driver behavior: shared state-machine plumbing plus per-archetype
//! transition rules.

use ud_core::{AgentRng, NodeId, SimInstant, SimTime, WeekDay};
use ud_fleet::Personality;
use ud_spatial::RoadGraph;

use crate::{
    AgentBody, BehaviorError, BehaviorResult, BehaviorSignal, MoveEvent, MovementEngine,
    MoverAction,
};

// ── RoundPlan ─────────────────────────────────────────────────────────────────

/// One stop of a resolved round: establishment identity plus its resolved
/// road node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundStop {
    pub establishment: String,
    pub node: NodeId,
}

/// A round with every stop resolved to a road node, ready to drive.
#[derive(Clone, Debug)]
pub struct RoundPlan {
    pub origin: RoundStop,
    /// Establishments to visit in order (workplaces or delivery customers).
    pub stops: Vec<RoundStop>,
    /// First departure carried by the source data; only delivery drivers
    /// use it — commuter archetypes draw their own windows.
    pub departure: SimTime,
}

// ── Archetype ─────────────────────────────────────────────────────────────────

/// The fixed behavior variants.  Selection policy lives in the construction
/// pipeline; transition rules live here.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Archetype {
    /// Commute to the single workplace in the morning, home in the evening.
    Worker,
    /// As [`Worker`](Self::Worker), plus a noon return-home pair.
    WorkerHomeAtNoon,
    /// Visit each of ≥2 establishments once, in round order.
    WorkerOneActivity,
    /// Tour every delivery stop back-to-back, no scheduled departures past
    /// the first.
    DeliveryDriver,
}

impl Archetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Worker            => "worker",
            Archetype::WorkerHomeAtNoon  => "worker_home_at_noon",
            Archetype::WorkerOneActivity => "worker_one_activity",
            Archetype::DeliveryDriver    => "delivery_driver",
        }
    }

    #[inline]
    fn is_commuter(self) -> bool {
        !matches!(self, Archetype::DeliveryDriver)
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── DriverBehavior ────────────────────────────────────────────────────────────

/// State machine of one driver agent.  Owns the agent's body and
/// personality; created once by the construction pipeline and mutated by
/// clock callbacks and movement-engine events until the round completes.
#[derive(Debug)]
pub struct DriverBehavior {
    archetype:   Archetype,
    body:        AgentBody,
    round:       RoundPlan,
    personality: Personality,
    next_action: MoverAction,

    /// Targets to reach, in order.  The last entry is always the origin.
    visits: Vec<RoundStop>,
    /// Index of the next target in `visits`.
    position: usize,

    /// Instant each departure actually fired, one per completed-or-running
    /// leg (commuters) or just the initial leave (delivery).
    departures_fired: Vec<SimInstant>,
    /// A scheduled departure arrived while the agent was still driving the
    /// previous leg; it fires as soon as the agent parks.
    departure_due: bool,

    journey_minutes: u64,
    finished: bool,
}

impl DriverBehavior {
    /// Build a behavior over a resolved round.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::EmptyRound`] when the round visits no establishment —
    /// a configuration error that aborts this agent only.
    pub fn new(
        archetype:   Archetype,
        body:        AgentBody,
        round:       RoundPlan,
        personality: Personality,
    ) -> BehaviorResult<Self> {
        if round.stops.is_empty() {
            return Err(BehaviorError::EmptyRound { archetype: archetype.as_str() });
        }

        let visits = build_visits(archetype, &round);
        Ok(Self {
            archetype,
            body,
            next_action: MoverAction::Enter(round.origin.node),
            round,
            personality,
            visits,
            position: 0,
            departures_fired: Vec::new(),
            departure_due: false,
            journey_minutes: 0,
            finished: false,
        })
    }

    // ── Read accessors ────────────────────────────────────────────────────

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    /// The action the movement engine must execute next.
    #[inline]
    pub fn next_action(&self) -> MoverAction {
        self.next_action
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    pub fn round(&self) -> &RoundPlan {
        &self.round
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    /// Destination node of the current leg.
    pub fn destination(&self) -> NodeId {
        self.visits[self.position.min(self.visits.len() - 1)].node
    }

    /// Total journey minutes accumulated so far.
    pub fn journey_minutes(&self) -> u64 {
        self.journey_minutes
    }

    /// `true` once the final return to the origin has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of scheduled departures this archetype expects.
    pub fn expected_departures(&self) -> usize {
        match self.archetype {
            Archetype::DeliveryDriver => 1,
            _ => self.visits.len(),
        }
    }

    // ── Departure scheduling ──────────────────────────────────────────────

    /// Draw the scheduled departure times for this agent, in firing order.
    ///
    /// Commuter times fall on `day`; the delivery departure comes from the
    /// round data as loaded.
    pub fn departure_times(&self, rng: &mut AgentRng, day: WeekDay) -> Vec<SimTime> {
        match self.archetype {
            // Morning between 07:00 and 08:59, evening between 16:00 and 18:59.
            Archetype::Worker => vec![
                SimTime::new(day, rng.gen_range(7u8..9), rng.gen_range(0u8..60)),
                SimTime::new(day, rng.gen_range(16u8..19), rng.gen_range(0u8..60)),
            ],
            // Worker windows plus the noon pair: leave work 11:xx, leave
            // home again 13:xx.
            Archetype::WorkerHomeAtNoon => vec![
                SimTime::new(day, rng.gen_range(7u8..9), rng.gen_range(0u8..60)),
                SimTime::new(day, 11, rng.gen_range(0u8..60)),
                SimTime::new(day, 13, rng.gen_range(0u8..60)),
                SimTime::new(day, rng.gen_range(16u8..19), rng.gen_range(0u8..60)),
            ],
            // One departure per leg, legs spread over 07:00–19:00 in equal
            // hour windows.
            Archetype::WorkerOneActivity => {
                let legs = self.visits.len() as u32;
                let window = (12 / legs).max(1);
                (0..legs)
                    .map(|i| {
                        // Clamp keeps pathologically long rounds inside the day.
                        let hour = (7 + i * window + rng.gen_range(0..window)).min(23) as u8;
                        SimTime::new(day, hour, rng.gen_range(0u8..60))
                    })
                    .collect()
            }
            Archetype::DeliveryDriver => vec![self.round.departure],
        }
    }

    /// A scheduled departure fired.
    ///
    /// Sets the next action to `Leave` the current parking and emits
    /// [`BehaviorSignal::RoundDeparture`].  If the agent is still driving
    /// the previous leg the departure is deferred until it parks.
    pub fn on_departure(&mut self, now: SimInstant) -> Vec<BehaviorSignal> {
        if self.finished || self.position >= self.visits.len() {
            return vec![];
        }
        match self.next_action {
            MoverAction::Wait | MoverAction::Enter(_) => self.depart(now),
            _ => {
                self.departure_due = true;
                vec![]
            }
        }
    }

    fn depart(&mut self, now: SimInstant) -> Vec<BehaviorSignal> {
        let from = self.parked_at();
        self.next_action = MoverAction::Leave(from);
        self.departures_fired.push(now);
        vec![BehaviorSignal::RoundDeparture]
    }

    /// Node the agent currently parks at: the origin before the first
    /// arrival, the last reached visit afterwards.
    fn parked_at(&self) -> NodeId {
        if self.position == 0 {
            self.round.origin.node
        } else {
            self.visits[self.position - 1].node
        }
    }

    // ── Movement-engine events ────────────────────────────────────────────

    /// Consume one movement-engine event and return any lifecycle signals.
    pub fn handle_event(&mut self, event: MoveEvent, now: SimInstant) -> Vec<BehaviorSignal> {
        match event {
            MoveEvent::ParkingLeft => {
                self.body.leave_parking();
                self.next_action = MoverAction::Move;
                vec![]
            }
            MoveEvent::ParkingEntered => {
                self.body.enter_parking();
                self.next_action = MoverAction::Wait;
                if self.departure_due && !self.finished {
                    self.departure_due = false;
                    return self.depart(now);
                }
                vec![]
            }
            MoveEvent::DestinationReached => self.on_destination_reached(now),
        }
    }

    fn on_destination_reached(&mut self, now: SimInstant) -> Vec<BehaviorSignal> {
        debug_assert!(self.position < self.visits.len(), "arrival past end of round");
        let reached = self.visits[self.position].node;
        self.body.node = reached;
        self.position += 1;
        let last = self.position == self.visits.len();

        if self.archetype.is_commuter() {
            // Each commuter leg starts with its own scheduled departure.
            let departed = self.departures_fired[self.position - 1];
            self.journey_minutes += now.since(departed);
            self.next_action = MoverAction::Enter(reached);
            if last {
                return self.finalize_round();
            }
            vec![]
        } else {
            if last {
                // Back at the depot: one journey from the initial leave.
                self.journey_minutes = now.since(self.departures_fired[0]);
                self.next_action = MoverAction::Enter(reached);
                return self.finalize_round();
            }
            // Drop-off: continue to the next customer without parking.
            self.next_action = MoverAction::Leave(reached);
            vec![]
        }
    }

    fn finalize_round(&mut self) -> Vec<BehaviorSignal> {
        self.finished = true;
        self.personality.record_journey(self.journey_minutes);
        let satisfaction = self.personality.compute_satisfaction();
        vec![BehaviorSignal::RoundEnd { satisfaction }]
    }

    // ── Route validation ──────────────────────────────────────────────────

    /// Check that every leg of the visit sequence is routable.
    ///
    /// Called by the construction pipeline before the agent is accepted; a
    /// failure abandons this agent without touching its siblings.
    pub fn validate_route<E: MovementEngine>(
        &self,
        engine: &E,
        graph:  &RoadGraph,
    ) -> BehaviorResult<()> {
        let mut from = self.round.origin.node;
        for stop in &self.visits {
            engine.route_minutes(graph, from, stop.node)?;
            from = stop.node;
        }
        Ok(())
    }
}

/// The ordered arrival targets of one round.  The final target is always the
/// origin.
fn build_visits(archetype: Archetype, round: &RoundPlan) -> Vec<RoundStop> {
    let work = || round.stops[0].clone();
    let home = || round.origin.clone();
    match archetype {
        Archetype::Worker => vec![work(), home()],
        Archetype::WorkerHomeAtNoon => vec![work(), home(), work(), home()],
        Archetype::WorkerOneActivity | Archetype::DeliveryDriver => {
            let mut visits = round.stops.clone();
            visits.push(home());
            visits
        }
    }
}
