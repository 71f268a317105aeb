//! Road graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing neighbours occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! A separate `in_degree` array is kept so dead-end detection (a node with no
//! incoming *or* no outgoing connection) is a single indexed read per node.

use std::fmt;

use ud_core::{GeoPoint, NodeId};

// ── RoadClass ─────────────────────────────────────────────────────────────────

/// OSM-style road classification carried by every graph node (the class of
/// the road the node belongs to).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RoadClass {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Unclassified,
    LivingStreet,
    Service,
}

/// Establishments are never resolved onto these road classes, even when such
/// a node is geometrically closest.
///
/// Living streets and service ways are excluded because resolving onto them
/// too often lands agents in dead ends; motorways and trunks are
/// limited-access.
pub const FORBIDDEN_DELIVERY_CLASSES: [RoadClass; 6] = [
    RoadClass::Motorway,
    RoadClass::MotorwayLink,
    RoadClass::Trunk,
    RoadClass::TrunkLink,
    RoadClass::LivingStreet,
    RoadClass::Service,
];

impl RoadClass {
    /// `true` if establishments may be resolved onto this class.
    #[inline]
    pub fn is_delivery_eligible(self) -> bool {
        !FORBIDDEN_DELIVERY_CLASSES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway     => "motorway",
            RoadClass::MotorwayLink => "motorway_link",
            RoadClass::Trunk        => "trunk",
            RoadClass::TrunkLink    => "trunk_link",
            RoadClass::Primary      => "primary",
            RoadClass::Secondary    => "secondary",
            RoadClass::Tertiary     => "tertiary",
            RoadClass::Residential  => "residential",
            RoadClass::Unclassified => "unclassified",
            RoadClass::LivingStreet => "living_street",
            RoadClass::Service      => "service",
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format.
///
/// All fields are `pub` for direct indexed access.  Do not construct
/// directly; use [`RoadGraphBuilder`].
pub struct RoadGraph {
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Road classification of each node.  Indexed by `NodeId`.
    pub node_class: Vec<RoadClass>,

    /// CSR row pointer.  Outgoing neighbours of node `n` are at
    /// `edge_to[node_out_start[n] .. node_out_start[n+1]]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Destination node of each edge, sorted by source node.
    pub edge_to: Vec<NodeId>,

    /// Number of incoming edges per node.  Indexed by `NodeId`.
    pub in_degree: Vec<u32>,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Position of `node`.
    #[inline]
    pub fn position(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    /// Nodes with no incoming or no outgoing connection.
    ///
    /// These trap agents: a node that cannot be entered is unreachable, one
    /// that cannot be left strands whoever parks there.  The list is handed
    /// to the [`DeadEndRepair`][crate::DeadEndRepair] routine before
    /// establishment resolution.
    pub fn dead_ends(&self) -> Vec<NodeId> {
        (0..self.node_count() as u32)
            .map(NodeId)
            .filter(|&n| self.out_degree(n) == 0 || self.in_degree[n.index()] == 0)
            .collect()
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node and constructs the CSR arrays.
///
/// # Example
///
/// ```
/// use ud_core::GeoPoint;
/// use ud_spatial::{RoadClass, RoadGraphBuilder};
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(45.75, 4.85), RoadClass::Residential);
/// let c = b.add_node(GeoPoint::new(45.76, 4.85), RoadClass::Residential);
/// b.add_road(a, c); // bidirectional
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2);
/// ```
pub struct RoadGraphBuilder {
    nodes:     Vec<(GeoPoint, RoadClass)>,
    raw_edges: Vec<(NodeId, NodeId)>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint, class: RoadClass) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((pos, class));
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId) {
        self.raw_edges.push((from, to));
    }

    /// Convenience: add edges in **both directions** for an undirected road
    /// segment (the common case for most road types).
    pub fn add_road(&mut self, a: NodeId, b: NodeId) {
        self.add_directed_edge(a, b);
        self.add_directed_edge(b, a);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Time complexity: O(E log E) for the edge sort, where E = edges.
    pub fn build(self) -> RoadGraph {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Sort edges by source node for CSR construction.
        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|&(from, _)| from.0);

        let edge_to: Vec<NodeId> = raw.iter().map(|&(_, to)| to).collect();

        // Build CSR row pointer and in-degree counts.
        let mut node_out_start = vec![0u32; node_count + 1];
        let mut in_degree      = vec![0u32; node_count];
        for &(from, to) in &raw {
            node_out_start[from.index() + 1] += 1;
            in_degree[to.index()] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let (node_pos, node_class) = self.nodes.into_iter().unzip();

        RoadGraph {
            node_pos,
            node_class,
            node_out_start,
            edge_to,
            in_degree,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
