//! Graph search over roadmaps
//!
//! Every search looks its endpoints up through [`Graph::descriptor`], so
//! start and goal must be registered vertices. An unreachable goal gives an
//! empty path; `start == goal` gives the single-point path.

pub mod a_star;
pub mod bidirectional_bfs;
pub mod breadth_first;
pub mod depth_first;
pub mod dijkstra;

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{GraphSearch, Path2D, PlannerResult, Point2D};
use crate::roadmap::Graph;

pub use a_star::{AStar, AStarConfig};
pub use bidirectional_bfs::BidirectionalBreadthFirst;
pub use breadth_first::BreadthFirst;
pub use depth_first::DepthFirst;
pub use dijkstra::Dijkstra;

/// Search that ignores the graph and returns `[start, goal]`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSearch;

impl GraphSearch for NoSearch {
    fn search(&self, _graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        Ok(Path2D::from_points(vec![start, goal]))
    }
}

/// Graph search selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchKind {
    #[default]
    None,
    Dijkstra,
    AStar(AStarConfig),
    BreadthFirst,
    BidirectionalBreadthFirst,
    DepthFirst,
}

impl SearchKind {
    pub fn validate(&self) -> PlannerResult<()> {
        match self {
            SearchKind::AStar(config) => config.validate(),
            _ => Ok(()),
        }
    }
}

impl GraphSearch for SearchKind {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        match self {
            SearchKind::None => NoSearch.search(graph, start, goal),
            SearchKind::Dijkstra => Dijkstra.search(graph, start, goal),
            SearchKind::AStar(config) => AStar::new(config.clone()).search(graph, start, goal),
            SearchKind::BreadthFirst => BreadthFirst.search(graph, start, goal),
            SearchKind::BidirectionalBreadthFirst => {
                BidirectionalBreadthFirst.search(graph, start, goal)
            }
            SearchKind::DepthFirst => DepthFirst.search(graph, start, goal),
        }
    }
}

/// Priority queue item, ordered for a min-heap on `cost` with ties going to
/// the smaller vertex index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueItem {
    pub cost: OrderedFloat<f64>,
    pub index: usize,
}

impl QueueItem {
    pub fn new(cost: f64, index: usize) -> Self {
        QueueItem {
            cost: OrderedFloat(cost),
            index,
        }
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Look up the vertex indices of `start` and `goal`
pub(crate) fn endpoints(graph: &Graph, start: &Point2D, goal: &Point2D) -> PlannerResult<(usize, usize)> {
    Ok((graph.descriptor(start)?, graph.descriptor(goal)?))
}

/// Follow parent links back from `goal` and return the path in start-to-goal
/// order
pub(crate) fn reconstruct_path(graph: &Graph, parents: &[Option<usize>], goal: usize) -> Path2D {
    let mut indices = vec![goal];
    let mut current = goal;
    while let Some(parent) = parents[current] {
        indices.push(parent);
        current = parent;
    }
    indices.reverse();
    Path2D::from_points(indices.into_iter().map(|i| graph.vertices()[i]).collect())
}
