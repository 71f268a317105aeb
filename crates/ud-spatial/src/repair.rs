//! Dead-end repair contract.
//!
//! Graph repair itself (adding return arcs so trapped nodes become
//! traversable) is performed by an external routine; the preprocessing
//! pipeline only scans for dead ends and hands the list over through this
//! trait.

use ud_core::NodeId;

use crate::RoadGraph;

/// External routine invoked once, before establishment resolution, with the
/// dead-end nodes found in the graph.
pub trait DeadEndRepair {
    /// Inspect (and, in a real implementation, repair) the listed dead ends.
    fn repair(&mut self, graph: &RoadGraph, dead_ends: &[NodeId]);
}

/// A [`DeadEndRepair`] that does nothing.  Use when the input graph is known
/// to be clean (synthetic grids, pre-repaired extracts).
pub struct NoRepair;

impl DeadEndRepair for NoRepair {
    fn repair(&mut self, _graph: &RoadGraph, _dead_ends: &[NodeId]) {}
}
