//! Depth-first search: existence only, no optimality

use crate::common::{GraphSearch, Path2D, PlannerResult, Point2D};
use crate::graph_search::{endpoints, reconstruct_path};
use crate::roadmap::Graph;

/// Stack-based search returning the first path found to the goal
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirst;

impl GraphSearch for DepthFirst {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let (start_idx, goal_idx) = endpoints(graph, &start, &goal)?;
        if start_idx == goal_idx {
            return Ok(Path2D::from_points(vec![start]));
        }

        let n = graph.num_vertices();
        let mut visited = vec![false; n];
        let mut parents: Vec<Option<usize>> = vec![None; n];
        let mut stack = vec![start_idx];

        while let Some(u) = stack.pop() {
            if visited[u] {
                continue;
            }
            visited[u] = true;
            if u == goal_idx {
                return Ok(reconstruct_path(graph, &parents, goal_idx));
            }
            // pushed in reverse so the smallest neighbour is explored first
            for (v, _) in graph.neighbors(u).rev() {
                if !visited[v] {
                    parents[v] = Some(u);
                    stack.push(v);
                }
            }
        }

        Ok(Path2D::new())
    }
}
