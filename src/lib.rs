//! RustMotionPlanning - composable 2D motion-planning pipeline
//!
//! An occupancy map is turned into a roadmap graph, a graph search extracts
//! a discrete path and a local interpolator turns it into an executable
//! path, each stage chosen independently through [`PlannerConfig`].

// Core modules
pub mod common;
pub mod mapping;

// Pipeline stages
pub mod roadmap;
pub mod graph_search;
pub mod interpolation;
pub mod planner;

// Re-export common types for convenience
pub use common::{Metric, Path2D, Point2D, ProblemDefinition};
pub use common::{GraphSearch, Interpolator, RoadmapBuilder};
pub use common::{PlannerError, PlannerResult};
pub use mapping::{OccupancyMap, Workspace};
pub use roadmap::{Graph, Roadmap, RoadmapKind, RoadmapQuality};
pub use graph_search::SearchKind;
pub use interpolation::{InterpolatorKind, RefineOutcome, Refinement, StallCause};
pub use planner::{Planner, PlannerConfig, RoadmapCache, SolveReport};
