//! The physical agent: one vehicle, one location, one parking state.

use ud_core::NodeId;
use ud_fleet::Vehicle;

/// The body of one driver agent.  Exclusively owned by exactly one
/// [`DriverBehavior`][crate::DriverBehavior].
#[derive(Clone, Debug)]
pub struct AgentBody {
    pub vehicle: Vehicle,

    /// Road node the agent is at (or last departed from while in transit).
    pub node: NodeId,

    /// `true` while parked at an establishment.
    pub parked: bool,
}

impl AgentBody {
    /// A body parked nowhere yet, positioned at `node`.
    pub fn new(vehicle: Vehicle, node: NodeId) -> Self {
        Self { vehicle, node, parked: false }
    }

    pub fn enter_parking(&mut self) {
        self.parked = true;
    }

    pub fn leave_parking(&mut self) {
        self.parked = false;
    }
}
