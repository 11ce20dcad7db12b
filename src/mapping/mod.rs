//! Occupancy maps and the derived clearance queries

pub mod distance_field;
pub mod occupancy_map;

pub use distance_field::DistanceField;
pub use occupancy_map::{FreeRegions, OccupancyMap};

/// The environment a planner works in
#[derive(Debug, Clone)]
pub struct Workspace {
    pub map: OccupancyMap,
}

impl Workspace {
    pub fn new(map: OccupancyMap) -> Self {
        Self { map }
    }
}

impl From<OccupancyMap> for Workspace {
    fn from(map: OccupancyMap) -> Self {
        Self { map }
    }
}
