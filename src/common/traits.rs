//! Common traits defining the three pipeline stages
//!
//! Each family is closed (see [`crate::roadmap::RoadmapKind`],
//! [`crate::graph_search::SearchKind`] and
//! [`crate::interpolation::InterpolatorKind`]); the traits give every variant
//! the same single-operation signature.

use crate::common::error::PlannerResult;
use crate::common::types::*;
use crate::interpolation::Refinement;
use crate::mapping::OccupancyMap;
use crate::roadmap::{Graph, Roadmap};

/// Converts an occupancy map into a roadmap graph
pub trait RoadmapBuilder {
    /// Build a roadmap. Must not depend on anything but the map (and, for
    /// sampling builders, their random source).
    fn build(&self, map: &OccupancyMap) -> PlannerResult<Roadmap>;
}

/// Extracts a discrete path from a roadmap
pub trait GraphSearch {
    /// Search from `start` to `goal`, both of which must be registered
    /// vertices. Unreachable goals give an empty path, not an error.
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D>;
}

/// Turns a discrete path into an executable one using local map queries only
pub trait Interpolator {
    /// Refine `path`, returning the trace and whether it reached the goal
    fn refine(&self, map: &OccupancyMap, path: &Path2D) -> Refinement;
}
