//! Nearest-eligible-node spatial index.
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`.  The
//! index is built **once**, over the delivery-eligible subset of graph nodes
//! only — filtering happens at build time, not query time, so a nearest-node
//! query can never return a forbidden-class node no matter how close one is.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ud_core::{GeoPoint, NodeId};

use crate::RoadGraph;

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a 2-D `[lat, lon]` point with the associated
/// `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Sufficient for
    /// nearest-node queries within a city (error < 0.1 % at ≤ 60° lat).
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── NodeIndex ─────────────────────────────────────────────────────────────────

/// Spatial index over the delivery-eligible nodes of a [`RoadGraph`].
pub struct NodeIndex {
    tree: RTree<NodeEntry>,
}

impl NodeIndex {
    /// Bulk-load the index from every graph node whose road class is
    /// delivery-eligible (O(N log N), faster than N inserts).
    pub fn eligible(graph: &RoadGraph) -> Self {
        let entries: Vec<NodeEntry> = graph
            .node_pos
            .iter()
            .zip(&graph.node_class)
            .enumerate()
            .filter(|(_, (_, class))| class.is_delivery_eligible())
            .map(|(i, (&pos, _))| NodeEntry {
                point: [pos.lat, pos.lon],
                id: NodeId(i as u32),
            })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// The `NodeId` of the nearest indexed node to `pos`.
    ///
    /// Returns `None` only if the index holds no eligible nodes.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.tree
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }

    /// Number of indexed (eligible) nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
