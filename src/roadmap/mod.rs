//! Roadmap construction: occupancy map in, weighted graph out

pub mod graph;
pub mod prm;
pub mod voronoi_road_map;

use serde::{Deserialize, Serialize};

use crate::common::{PlannerResult, RoadmapBuilder};
use crate::mapping::OccupancyMap;

pub use graph::{Graph, NO_EDGE};
pub use prm::{ProbabilisticRoadMap, ProbabilisticRoadMapConfig};
pub use voronoi_road_map::{VoronoiRoadMap, VoronoiRoadMapConfig};

/// Whether a builder met its own completeness target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadmapQuality {
    Complete,
    /// The connectivity cap was hit: the graph has more components than the
    /// free space it samples
    Degraded {
        components: usize,
        regions: usize,
        batches: usize,
    },
}

/// Builder output
#[derive(Debug, Clone)]
pub struct Roadmap {
    pub graph: Graph,
    pub quality: RoadmapQuality,
}

impl Roadmap {
    pub fn complete(graph: Graph) -> Self {
        Self {
            graph,
            quality: RoadmapQuality::Complete,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.quality, RoadmapQuality::Degraded { .. })
    }
}

/// Builder that produces an empty graph
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoadmap;

impl RoadmapBuilder for NoRoadmap {
    fn build(&self, _map: &OccupancyMap) -> PlannerResult<Roadmap> {
        Ok(Roadmap::complete(Graph::new()))
    }
}

/// Roadmap builder selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoadmapKind {
    #[default]
    None,
    Voronoi(VoronoiRoadMapConfig),
    Probabilistic(ProbabilisticRoadMapConfig),
}

impl RoadmapKind {
    pub fn validate(&self) -> PlannerResult<()> {
        match self {
            RoadmapKind::None | RoadmapKind::Probabilistic(_) => Ok(()),
            RoadmapKind::Voronoi(config) => config.validate(),
        }
    }
}

impl RoadmapBuilder for RoadmapKind {
    fn build(&self, map: &OccupancyMap) -> PlannerResult<Roadmap> {
        match self {
            RoadmapKind::None => NoRoadmap.build(map),
            RoadmapKind::Voronoi(config) => VoronoiRoadMap::new(config.clone()).build(map),
            RoadmapKind::Probabilistic(config) => {
                ProbabilisticRoadMap::new(config.clone()).build(map)
            }
        }
    }
}
