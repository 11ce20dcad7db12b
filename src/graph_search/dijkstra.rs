//! Uniform-cost (Dijkstra) search

use std::collections::BinaryHeap;

use log::debug;

use crate::common::{GraphSearch, Path2D, PlannerResult, Point2D};
use crate::graph_search::{endpoints, reconstruct_path, QueueItem};
use crate::roadmap::Graph;

/// Minimum-weight search over non-negative edge weights
#[derive(Debug, Clone, Copy, Default)]
pub struct Dijkstra;

impl GraphSearch for Dijkstra {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let (start_idx, goal_idx) = endpoints(graph, &start, &goal)?;
        if start_idx == goal_idx {
            return Ok(Path2D::from_points(vec![start]));
        }

        let n = graph.num_vertices();
        let mut cost = vec![f64::INFINITY; n];
        let mut parents: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open_set = BinaryHeap::new();

        cost[start_idx] = 0.0;
        open_set.push(QueueItem::new(0.0, start_idx));

        while let Some(current) = open_set.pop() {
            let u = current.index;
            if closed[u] {
                continue;
            }
            closed[u] = true;

            if u == goal_idx {
                debug!("dijkstra reached goal with cost {:.3}", cost[u]);
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
                    open_set.push(QueueItem::new(new_cost, v));
                }
            }
        }

        debug!("dijkstra exhausted the open set without reaching the goal");
        Ok(Path2D::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_search::fixtures::{diamond, p};

    #[test]
    fn test_dijkstra_minimum_weight() {
        let g = diamond();
        let path = Dijkstra.search(&g, p(0), p(4)).unwrap();
        assert_eq!(path.points, vec![p(0), p(1), p(2), p(4)]);
        assert!((g.path_weight(&path).unwrap() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_dijkstra_reverse_direction() {
        let g = diamond();
        let path = Dijkstra.search(&g, p(4), p(0)).unwrap();
        assert_eq!(path.points, vec![p(4), p(2), p(1), p(0)]);
    }

    #[test]
    fn test_dijkstra_tie_break_is_deterministic() {
        // two equal-weight routes 0-1-3 and 0-2-3: the smaller index wins
        let mut g = Graph::new();
        for i in 0..4 {
            g.add_vertex(Point2D::new(i as f64, 0.0));
        }
        g.add_edge(0, 1, 1.0).unwrap();
        g.add_edge(0, 2, 1.0).unwrap();
        g.add_edge(1, 3, 1.0).unwrap();
        g.add_edge(2, 3, 1.0).unwrap();
        let first = Dijkstra.search(&g, Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0)).unwrap();
        assert_eq!(first.points[1], Point2D::new(1.0, 0.0));
        for _ in 0..5 {
            let again = Dijkstra.search(&g, Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0)).unwrap();
            assert_eq!(again, first);
        }
    }
}
