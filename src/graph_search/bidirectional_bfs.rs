//! Bidirectional breadth-first search
//!
//! Two level-order traversals, from the start and from the goal, advance
//! one full level at a time in turn. The first vertex discovered by one side
//! that the other side has already visited is the meeting point; every such
//! vertex lies on a fewest-hop path.

use log::debug;

use crate::common::{GraphSearch, Path2D, PlannerResult, Point2D};
use crate::graph_search::{endpoints, reconstruct_path};
use crate::roadmap::Graph;

/// Bidirectional breadth-first search
#[derive(Debug, Clone, Copy, Default)]
pub struct BidirectionalBreadthFirst;

/// One direction of the search
struct Frontier {
    visited: Vec<bool>,
    parents: Vec<Option<usize>>,
    level: Vec<usize>,
}

impl Frontier {
    fn new(n: usize, root: usize) -> Self {
        let mut visited = vec![false; n];
        visited[root] = true;
        Frontier {
            visited,
            parents: vec![None; n],
            level: vec![root],
        }
    }

    /// Expand the current level; returns the first newly discovered vertex
    /// already visited by `other`
    fn expand(&mut self, graph: &Graph, other: &Frontier) -> Option<usize> {
        let mut next = Vec::new();
        let mut meeting = None;
        for &u in &self.level {
            for (v, _) in graph.neighbors(u) {
                if self.visited[v] {
                    continue;
                }
                self.visited[v] = true;
                self.parents[v] = Some(u);
                next.push(v);
                if meeting.is_none() && other.visited[v] {
                    meeting = Some(v);
                }
            }
        }
        self.level = next;
        meeting
    }
}

impl GraphSearch for BidirectionalBreadthFirst {
    fn search(&self, graph: &Graph, start: Point2D, goal: Point2D) -> PlannerResult<Path2D> {
        let (start_idx, goal_idx) = endpoints(graph, &start, &goal)?;
        if start_idx == goal_idx {
            return Ok(Path2D::from_points(vec![start]));
        }

        let n = graph.num_vertices();
        let mut forward = Frontier::new(n, start_idx);
        let mut backward = Frontier::new(n, goal_idx);

        while !forward.level.is_empty() && !backward.level.is_empty() {
            if let Some(meet) = forward.expand(graph, &backward) {
                return Ok(splice(graph, &forward, &backward, meet));
            }
            if let Some(meet) = backward.expand(graph, &forward) {
                return Ok(splice(graph, &forward, &backward, meet));
            }
        }

        debug!("bidirectional breadth-first: frontiers never met");
        Ok(Path2D::new())
    }
}

/// Start-side path to `meet` in forward order, then the goal-side path from
/// `meet` onwards
fn splice(graph: &Graph, forward: &Frontier, backward: &Frontier, meet: usize) -> Path2D {
    let mut path = reconstruct_path(graph, &forward.parents, meet);
    let mut current = meet;
    while let Some(next) = backward.parents[current] {
        path.push(graph.vertices()[next]);
        current = next;
    }
    debug!("bidirectional breadth-first met at vertex {}", meet);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_search::fixtures::{diamond, p};
    use crate::graph_search::BreadthFirst;

    /// Path graph 0 - 1 - ... - (n - 1)
    fn chain(n: usize) -> Graph {
        let mut g = Graph::new();
        for i in 0..n {
            g.add_vertex(Point2D::new(i as f64, 0.0));
        }
        for i in 1..n {
            g.add_edge(i - 1, i, 1.0).unwrap();
        }
        g
    }

    #[test]
    fn test_splice_order_on_chain() {
        for n in [2, 3, 4, 7, 8] {
            let g = chain(n);
            let start = Point2D::new(0.0, 0.0);
            let goal = Point2D::new((n - 1) as f64, 0.0);
            let path = BidirectionalBreadthFirst.search(&g, start, goal).unwrap();
            assert_eq!(path.points, g.vertices().to_vec());
        }
    }

    #[test]
    fn test_same_hops_as_bfs() {
        let g = diamond();
        let bi = BidirectionalBreadthFirst.search(&g, p(0), p(4)).unwrap();
        let single = BreadthFirst.search(&g, p(0), p(4)).unwrap();
        assert_eq!(bi.hop_count(), single.hop_count());
        assert!(g.path_weight(&bi).is_ok());
    }
}
