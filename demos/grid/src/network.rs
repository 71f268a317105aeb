//! Synthetic road network for the grid demo: a 5×5 residential grid with a
//! motorway pair cutting along the eastern edge.

use ud_core::GeoPoint;
use ud_spatial::{RoadClass, RoadGraph, RoadGraphBuilder};

pub const GRID: usize = 5;

/// Latitude/longitude spacing between grid nodes (~550 m).
const STEP: f32 = 0.005;
const LAT0: f32 = 45.750;
const LON0: f32 = 4.850;

/// Build the demo network.  Node ids: `row * GRID + col` for the grid, then
/// the two motorway nodes.
pub fn build_network() -> RoadGraph {
    let mut b = RoadGraphBuilder::new();

    for row in 0..GRID {
        for col in 0..GRID {
            b.add_node(
                GeoPoint::new(LAT0 + row as f32 * STEP, LON0 + col as f32 * STEP),
                RoadClass::Residential,
            );
        }
    }
    let id = |r: usize, c: usize| ud_core::NodeId((r * GRID + c) as u32);
    for row in 0..GRID {
        for col in 0..GRID {
            if col + 1 < GRID {
                b.add_road(id(row, col), id(row, col + 1));
            }
            if row + 1 < GRID {
                b.add_road(id(row, col), id(row + 1, col));
            }
        }
    }

    // Motorway pair east of the grid; nothing may resolve onto it.
    let m0 = b.add_node(GeoPoint::new(LAT0, LON0 + GRID as f32 * STEP), RoadClass::Motorway);
    let m1 = b.add_node(
        GeoPoint::new(LAT0 + (GRID - 1) as f32 * STEP, LON0 + GRID as f32 * STEP),
        RoadClass::Motorway,
    );
    b.add_road(m0, m1);
    b.add_road(m0, ud_core::NodeId((GRID - 1) as u32));

    b.build()
}
