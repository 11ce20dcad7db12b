//! A* (best-first heuristic) search
//!
//! Priority is `g(v) + weight * h(v)` with `h` given by a [`Metric`] to the
//! goal's embedding. With `Metric::Euclidean` and `weight == 1` the result
//! is optimal on Euclidean-weighted roadmaps; other choices trade optimality
//! for fewer expansions.

use std::collections::BinaryHeap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{GraphSearch, Metric, Path2D, PlannerError, PlannerResult, Point2D};
use crate::graph_search::{endpoints, reconstruct_path, QueueItem};
use crate::roadmap::Graph;

/// Configuration for A* search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Heuristic distance to the goal
    pub metric: Metric,
    /// Heuristic weight (1.0 = optimal with an admissible metric, >1.0 = faster but suboptimal)
    pub weight: f64,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
            weight: 1.0,
        }
    }
}

impl AStarConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "A* heuristic weight must be non-negative, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

/// A* search
#[derive(Debug, Clone, Default)]
pub struct AStar {
    config: AStarConfig,
}

impl AStar {
    pub fn new(config: AStarConfig) -> Self {
        AStar { config }
    }

    fn calc_heuristic(&self, p: &Point2D, goal: &Point2D) -> f64 {
        self.config.weight * self.config.metric.distance(p, goal)
    }
}

impl GraphSearch for AStar {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let (start_idx, goal_idx) = endpoints(graph, &start, &goal)?;
        if start_idx == goal_idx {
            return Ok(Path2D::from_points(vec![start]));
        }

        let n = graph.num_vertices();
        let vertices = graph.vertices();
        let mut cost = vec![f64::INFINITY; n];
        let mut parents: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open_set = BinaryHeap::new();

        cost[start_idx] = 0.0;
        open_set.push(QueueItem::new(
            self.calc_heuristic(&vertices[start_idx], &goal),
            start_idx,
        ));

        let mut iteration = 0;
        while let Some(current) = open_set.pop() {
            let u = current.index;
            if closed[u] {
                continue;
            }
            closed[u] = true;
            iteration += 1;

            if u == goal_idx {
                debug!(
                    "a* reached goal after {} expansions with cost {:.3}",
                    iteration, cost[u]
                );
                return Ok(reconstruct_path(graph, &parents, goal_idx));
            }

            for (v, w) in graph.neighbors(u) {
                if closed[v] {
                    continue;
                }
                let new_cost = cost[u] + w;
                if new_cost < cost[v] {
                    cost[v] = new_cost;
                    parents[v] = Some(u);
                    let priority = new_cost + self.calc_heuristic(&vertices[v], &goal);
                    open_set.push(QueueItem::new(priority, v));
                }
            }
        }

        debug!("a* exhausted the open set after {} expansions", iteration);
        Ok(Path2D::new())
    }
}
