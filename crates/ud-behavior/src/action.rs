//! Actions, engine events, and behavior signals.

use ud_core::NodeId;

/// The action the movement engine must execute next for an agent.
///
/// Written by the owning behavior, read by the engine each tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MoverAction {
    /// Stay parked.
    Wait,
    /// Keep moving toward the current leg's destination.
    Move,
    /// Park at `NodeId` (the resolved node of the reached establishment).
    Enter(NodeId),
    /// Leave the parking at `NodeId` and begin the next leg.
    Leave(NodeId),
}

/// The three event kinds the movement engine raises back into a behavior.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MoveEvent {
    /// The agent pulled out of its parking spot.
    ParkingLeft,
    /// The agent parked.
    ParkingEntered,
    /// The agent reached the destination of its current leg.
    DestinationReached,
}

/// Fire-and-forget notifications emitted by behavior transitions, consumed
/// by the simulation loop (round registry, observers, visualization).
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum BehaviorSignal {
    /// A scheduled departure fired and the agent is leaving its parking.
    RoundDeparture,
    /// The final return to the origin completed the round.
    RoundEnd {
        /// Satisfaction derived by the agent's personality, to be propagated
        /// to the neighborhood aggregate.
        satisfaction: f32,
    },
}
