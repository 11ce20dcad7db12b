//! Local interpolation: turn a discrete path into an executable trace
//!
//! Interpolators only see the map through its local queries and use the
//! discrete path as a sequence of waypoints, the first one being the start.

pub mod bug;
pub mod potential_field;

use serde::{Deserialize, Serialize};

use crate::common::{Interpolator, Path2D, PlannerResult, Point2D};
use crate::mapping::OccupancyMap;

pub use bug::{BugNavigator, BugNavigatorConfig, WallSide};
pub use potential_field::{PotentialField, PotentialFieldConfig};

/// Why a navigator gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallCause {
    /// Attractive and repulsive forces cancel away from the goal
    LocalMinimum,
    /// The wall follower came back to a state it had already been in
    Cycle,
    /// No admissible move exists
    Blocked,
    /// The step budget ran out
    IterationLimit,
}

/// Result of a refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefineOutcome {
    Complete,
    /// The discrete path was empty
    NoInput,
    Stalled { at: Point2D, cause: StallCause },
}

/// Trace produced by an interpolator and how it ended.
///
/// On a stall the trace holds every position visited up to that point.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub path: Path2D,
    pub outcome: RefineOutcome,
}

impl Refinement {
    pub fn complete(path: Path2D) -> Self {
        Refinement {
            path,
            outcome: RefineOutcome::Complete,
        }
    }

    pub fn no_input() -> Self {
        Refinement {
            path: Path2D::new(),
            outcome: RefineOutcome::NoInput,
        }
    }

    pub fn stalled(path: Path2D, at: Point2D, cause: StallCause) -> Self {
        Refinement {
            path,
            outcome: RefineOutcome::Stalled { at, cause },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == RefineOutcome::Complete
    }
}

/// Identity interpolator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterpolation;

impl Interpolator for NoInterpolation {
    fn refine(&self, _map: &OccupancyMap, path: &Path2D) -> Refinement {
        if path.is_empty() {
            return Refinement::no_input();
        }
        Refinement::complete(path.clone())
    }
}

/// Interpolator selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolatorKind {
    #[default]
    None,
    Bug(BugNavigatorConfig),
    PotentialField(PotentialFieldConfig),
}

impl InterpolatorKind {
    pub fn validate(&self) -> PlannerResult<()> {
        match self {
            InterpolatorKind::None => Ok(()),
            InterpolatorKind::Bug(config) => config.validate(),
            InterpolatorKind::PotentialField(config) => config.validate(),
        }
    }
}

impl Interpolator for InterpolatorKind {
    fn refine(&self, map: &OccupancyMap, path: &Path2D) -> Refinement {
        match self {
            InterpolatorKind::None => NoInterpolation.refine(map, path),
            InterpolatorKind::Bug(config) => BugNavigator::new(config.clone()).refine(map, path),
            InterpolatorKind::PotentialField(config) => {
                PotentialField::new(config.clone()).refine(map, path)
            }
        }
    }
}
