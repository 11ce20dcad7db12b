//! Planner: runs builder, search and interpolator under one configuration
//!
//! The roadmap for the loaded workspace is built lazily on the first query
//! and cached. Queries are answered on a copy of the cached graph with the
//! start and goal registered, so the cache never grows with queries.

pub mod config;

use log::{debug, info, warn};

use crate::common::{
    GraphSearch, Interpolator, Path2D, PlannerError, PlannerResult, Point2D, ProblemDefinition,
    RoadmapBuilder,
};
use crate::interpolation::RefineOutcome;
use crate::mapping::{OccupancyMap, Workspace};
use crate::roadmap::{Graph, Roadmap, RoadmapQuality};

pub use config::PlannerConfig;

/// Cached roadmap state
#[derive(Debug, Clone, Default)]
pub enum RoadmapCache {
    /// Nothing built yet
    #[default]
    Absent,
    /// Built for a previously loaded workspace
    Stale(Roadmap),
    /// Built for the loaded workspace
    Current(Roadmap),
}

impl RoadmapCache {
    pub fn is_current(&self) -> bool {
        matches!(self, RoadmapCache::Current(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RoadmapCache::Stale(_))
    }

    /// Cached roadmap, current or not
    pub fn roadmap(&self) -> Option<&Roadmap> {
        match self {
            RoadmapCache::Absent => None,
            RoadmapCache::Stale(roadmap) | RoadmapCache::Current(roadmap) => Some(roadmap),
        }
    }

    fn invalidate(self) -> Self {
        match self {
            RoadmapCache::Current(roadmap) => RoadmapCache::Stale(roadmap),
            other => other,
        }
    }
}

/// Everything one query produced
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Final path, empty unless the refinement completed
    pub path: Path2D,
    /// Graph search output
    pub discrete_path: Path2D,
    /// Interpolator output, kept even when it did not reach the goal
    pub trace: Path2D,
    pub outcome: RefineOutcome,
    pub quality: RoadmapQuality,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Motion planner
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlannerConfig,
    workspace: Option<Workspace>,
    cache: RoadmapCache,
}

impl Planner {
    /// Create a planner; invalid strategy parameters are rejected here
    pub fn new(config: PlannerConfig) -> PlannerResult<Self> {
        config.validate()?;
        Ok(Planner {
            config,
            workspace: None,
            cache: RoadmapCache::Absent,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Replace the workspace; a cached roadmap becomes stale
    pub fn load_workspace(&mut self, workspace: Workspace) {
        info!(
            "Loading {}x{} workspace ({:.1}% occupied)",
            workspace.map.width(),
            workspace.map.height(),
            workspace.map.occupied_fraction() * 100.0
        );
        self.workspace = Some(workspace);
        self.cache = std::mem::take(&mut self.cache).invalidate();
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn cache(&self) -> &RoadmapCache {
        &self.cache
    }

    /// Cached roadmap graph, without any query vertices
    pub fn roadmap(&self) -> Option<&Graph> {
        self.cache.roadmap().map(|roadmap| &roadmap.graph)
    }

    /// Solve a query, returning the final path (empty when no path was found
    /// or the refinement did not complete)
    pub fn solve(&mut self, pdef: &ProblemDefinition) -> PlannerResult<Path2D> {
        Ok(self.solve_report(pdef)?.path)
    }

    /// Solve a query and report every stage's result
    pub fn solve_report(&mut self, pdef: &ProblemDefinition) -> PlannerResult<SolveReport> {
        let map = match &self.workspace {
            Some(workspace) => &workspace.map,
            None => return Err(PlannerError::NoWorkspace),
        };

        if !self.cache.is_current() {
            let roadmap = self.config.roadmap_builder.build(map)?;
            info!(
                "Roadmap built: {} vertices, {} edges, {:?}",
                roadmap.graph.num_vertices(),
                roadmap.graph.num_edges(),
                roadmap.quality
            );
            self.cache = RoadmapCache::Current(roadmap);
        }
        let roadmap = self.cache.roadmap().ok_or(PlannerError::NoWorkspace)?;

        let mut graph = roadmap.graph.clone();
        register_query_point(&mut graph, map, pdef.start)?;
        register_query_point(&mut graph, map, pdef.goal)?;

        let discrete_path = self.config.graph_search.search(&graph, pdef.start, pdef.goal)?;
        debug!(
            "Discrete path: {} points, length {:.3}",
            discrete_path.len(),
            discrete_path.total_length()
        );

        let refinement = self.config.interpolator.refine(map, &discrete_path);
        let path = match refinement.outcome {
            RefineOutcome::Complete => refinement.path.clone(),
            RefineOutcome::NoInput => {
                debug!("No path between start and goal");
                Path2D::new()
            }
            RefineOutcome::Stalled { at, cause } => {
                warn!(
                    "Refinement stalled at ({:.2}, {:.2}): {:?}",
                    at.x, at.y, cause
                );
                Path2D::new()
            }
        };

        Ok(SolveReport {
            path,
            discrete_path,
            trace: refinement.path,
            outcome: refinement.outcome,
            quality: roadmap.quality,
        })
    }
}

/// Add `p` as a vertex of `graph` unless it already is one, connected to
/// every vertex it has line of sight to
fn register_query_point(graph: &mut Graph, map: &OccupancyMap, p: Point2D) -> PlannerResult<()> {
    if graph.contains(&p) {
        return Ok(());
    }
    let index = graph.add_vertex(p);
    let visible: Vec<(usize, f64)> = graph.vertices()[..index]
        .iter()
        .enumerate()
        .filter(|(_, v)| map.line_of_sight(v, &p))
        .map(|(j, v)| (j, v.distance(&p)))
        .collect();
    debug!("Registered query vertex {} with {} edges", index, visible.len());
    for (j, weight) in visible {
        graph.add_edge(index, j, weight)?;
    }
    Ok(())
}
