//! Movement-engine contract.
//!
//! The real pathfinding/physical-motion engine lives outside this workspace;
//! behaviors only depend on the travel-time contract below.
//! [`StraightLineEngine`] is the built-in placeholder for tests and demos —
//! it estimates, it does not pathfind.

use ud_core::NodeId;
use ud_spatial::RoadGraph;

use crate::{BehaviorError, BehaviorResult};

/// Computes the travel time of one leg.  Implementations must be
/// `Send + Sync`: the construction pipeline validates routes from parallel
/// tasks.
pub trait MovementEngine: Send + Sync {
    /// Whole-minute travel time from `from` to `to`, at least 1.
    ///
    /// # Errors
    ///
    /// [`BehaviorError::RouteConstruction`] when no feasible route exists
    /// between the two nodes.
    fn route_minutes(&self, graph: &RoadGraph, from: NodeId, to: NodeId)
        -> BehaviorResult<u32>;
}

/// Placeholder engine: great-circle distance at a constant speed.
pub struct StraightLineEngine {
    /// Average speed in metres per second.
    pub speed_mps: f32,
}

impl Default for StraightLineEngine {
    /// ~30 km/h — typical urban average.
    fn default() -> Self {
        Self { speed_mps: 8.3 }
    }
}

impl MovementEngine for StraightLineEngine {
    fn route_minutes(&self, graph: &RoadGraph, from: NodeId, to: NodeId)
        -> BehaviorResult<u32>
    {
        let nodes = graph.node_count();
        if from.index() >= nodes || to.index() >= nodes {
            return Err(BehaviorError::RouteConstruction { from, to });
        }
        let metres = graph.position(from).distance_m(graph.position(to));
        let minutes = (metres / self.speed_mps / 60.0).ceil() as u32;
        Ok(minutes.max(1))
    }
}
