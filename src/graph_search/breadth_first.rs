//! Breadth-first search: fewest hops, not least weight

use std::collections::VecDeque;

use log::debug;

use crate::common::{GraphSearch, Path2D, PlannerResult, Point2D};
use crate::graph_search::{endpoints, reconstruct_path};
use crate::roadmap::Graph;

/// Level-order search that stops as soon as the goal is discovered
#[derive(Debug, Clone, Copy, Default)]
pub struct BreadthFirst;

impl GraphSearch for BreadthFirst {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let (start_idx, goal_idx) = endpoints(graph, &start, &goal)?;
        if start_idx == goal_idx {
            return Ok(Path2D::from_points(vec![start]));
        }

        let n = graph.num_vertices();
        let mut visited = vec![false; n];
        let mut parents: Vec<Option<usize>> = vec![None; n];
        // accumulated weight along the tree, reported only
        let mut weight = vec![0.0; n];
        let mut queue = VecDeque::new();

        visited[start_idx] = true;
        queue.push_back(start_idx);

        while let Some(u) = queue.pop_front() {
            for (v, w) in graph.neighbors(u) {
                if visited[v] {
                    continue;
                }
                visited[v] = true;
                parents[v] = Some(u);
                weight[v] = weight[u] + w;
                if v == goal_idx {
                    debug!("breadth-first reached goal with weight {:.3}", weight[v]);
                    return Ok(reconstruct_path(graph, &parents, goal_idx));
                }
                queue.push_back(v);
            }
        }

        Ok(Path2D::new())
    }
}
