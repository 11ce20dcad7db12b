//! Undirected weighted graph over workspace points
//!
//! Vertices live in an arena addressed by dense index (insertion order);
//! a point is mapped back to its index by exact coordinate equality.
//! Adjacency is kept per vertex in a `BTreeMap` so that neighbours are
//! always visited in ascending index.

use std::collections::{BTreeMap, HashMap, VecDeque};

use ordered_float::OrderedFloat;

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D};

/// Weight reported for a pair of vertices with no edge between them
pub const NO_EDGE: f64 = -1.0;

type VertexKey = (OrderedFloat<f64>, OrderedFloat<f64>);

/// Roadmap graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Point2D>,
    index: HashMap<VertexKey, usize>,
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `point` as a vertex and return its index.
    ///
    /// Registering the same point twice returns the existing index.
    pub fn add_vertex(&mut self, point: Point2D) -> usize {
        if let Some(&i) = self.index.get(&point.key()) {
            return i;
        }
        let i = self.vertices.len();
        self.vertices.push(point);
        self.index.insert(point.key(), i);
        self.adjacency.push(BTreeMap::new());
        i
    }

    /// Set the weight between `i` and `j` in both directions.
    ///
    /// Self loops are ignored, a vertex always has weight 0 to itself.
    pub fn add_edge(&mut self, i: usize, j: usize, weight: f64) -> PlannerResult<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "edge weight must be finite and non-negative, got {}",
                weight
            )));
        }
        if i == j {
            return Ok(());
        }
        self.adjacency[i].insert(j, weight);
        self.adjacency[j].insert(i, weight);
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(|a| a.len()).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    pub fn vertex(&self, i: usize) -> PlannerResult<Point2D> {
        self.check_index(i)?;
        Ok(self.vertices[i])
    }

    /// Weight between `i` and `j`: 0 on the diagonal, [`NO_EDGE`] if unconnected
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        if i >= self.vertices.len() || j >= self.vertices.len() {
            return NO_EDGE;
        }
        if i == j {
            return 0.0;
        }
        self.adjacency[i].get(&j).copied().unwrap_or(NO_EDGE)
    }

    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        i != j && self.weight(i, j) >= 0.0
    }

    /// Index of the vertex registered at exactly `point`
    pub fn descriptor(&self, point: &Point2D) -> PlannerResult<usize> {
        self.index
            .get(&point.key())
            .copied()
            .ok_or(PlannerError::UnknownVertex {
                x: point.x,
                y: point.y,
            })
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        self.index.contains_key(&point.key())
    }

    /// `(neighbour, weight)` pairs of vertex `i` in ascending neighbour index
    pub fn neighbors(&self, i: usize) -> impl DoubleEndedIterator<Item = (usize, f64)> + '_ {
        self.adjacency
            .get(i)
            .into_iter()
            .flat_map(|a| a.iter().map(|(&j, &w)| (j, w)))
    }

    /// Every undirected edge once, as `(i, j, weight)` with `i < j`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(i, a)| {
            a.range(i + 1..).map(move |(&j, &w)| (i, j, w))
        })
    }

    /// Component label of every vertex, labels numbered from 0 in order of
    /// their lowest vertex index
    pub fn connected_components(&self) -> Vec<usize> {
        let n = self.vertices.len();
        let mut labels = vec![usize::MAX; n];
        let mut next_label = 0;
        let mut queue = VecDeque::new();

        for root in 0..n {
            if labels[root] != usize::MAX {
                continue;
            }
            labels[root] = next_label;
            queue.push_back(root);
            while let Some(v) = queue.pop_front() {
                for (u, _) in self.neighbors(v) {
                    if labels[u] == usize::MAX {
                        labels[u] = next_label;
                        queue.push_back(u);
                    }
                }
            }
            next_label += 1;
        }

        labels
    }

    pub fn num_components(&self) -> usize {
        self.connected_components()
            .into_iter()
            .max()
            .map_or(0, |max_label| max_label + 1)
    }

    /// Sum of edge weights along `path`, whose points must all be vertices
    /// joined by edges
    pub fn path_weight(&self, path: &Path2D) -> PlannerResult<f64> {
        let indices = path
            .points
            .iter()
            .map(|p| self.descriptor(p))
            .collect::<PlannerResult<Vec<_>>>()?;

        indices.windows(2).try_fold(0.0, |total, pair| {
            let w = self.weight(pair[0], pair[1]);
            if w < 0.0 {
                return Err(PlannerError::InvalidParameter(format!(
                    "no edge between vertices {} and {}",
                    pair[0], pair[1]
                )));
            }
            Ok(total + w)
        })
    }

    fn check_index(&self, i: usize) -> PlannerResult<()> {
        if i >= self.vertices.len() {
            return Err(PlannerError::VertexOutOfRange {
                index: i,
                len: self.vertices.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Graph {
        let mut g = Graph::new();
        let a = g.add_vertex(Point2D::new(0.0, 0.0));
        let b = g.add_vertex(Point2D::new(1.0, 0.0));
        let c = g.add_vertex(Point2D::new(1.0, 1.0));
        let d = g.add_vertex(Point2D::new(0.0, 1.0));
        g.add_edge(a, b, 1.0).unwrap();
        g.add_edge(b, c, 1.0).unwrap();
        g.add_edge(c, d, 1.0).unwrap();
        g
    }

    #[test]
    fn test_add_vertex_deduplicates() {
        let mut g = square();
        assert_eq!(g.add_vertex(Point2D::new(1.0, 1.0)), 2);
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.add_vertex(Point2D::new(1.0, 1.5)), 4);
    }

    #[test]
    fn test_weight_symmetry_and_sentinel() {
        let g = square();
        assert_eq!(g.weight(0, 1), 1.0);
        assert_eq!(g.weight(1, 0), 1.0);
        assert_eq!(g.weight(0, 2), NO_EDGE);
        assert_eq!(g.weight(3, 3), 0.0);
        assert_eq!(g.weight(0, 42), NO_EDGE);
        assert!(!g.has_edge(2, 2));
        assert_eq!(g.num_edges(), 3);
    }

    #[test]
    fn test_add_edge_rejects_bad_input() {
        let mut g = square();
        assert!(matches!(
            g.add_edge(0, 9, 1.0),
            Err(PlannerError::VertexOutOfRange { index: 9, len: 4 })
        ));
        assert!(g.add_edge(0, 2, -2.0).is_err());
        assert!(g.add_edge(0, 2, f64::NAN).is_err());
    }

    #[test]
    fn test_descriptor_round_trip() {
        let g = square();
        for i in 0..g.num_vertices() {
            assert_eq!(g.descriptor(&g.vertex(i).unwrap()).unwrap(), i);
        }
        assert!(matches!(
            g.descriptor(&Point2D::new(0.5, 0.5)),
            Err(PlannerError::UnknownVertex { .. })
        ));
    }

    #[test]
    fn test_neighbors_in_ascending_order() {
        let mut g = square();
        g.add_edge(1, 3, 2.0).unwrap();
        let n: Vec<usize> = g.neighbors(1).map(|(j, _)| j).collect();
        assert_eq!(n, vec![0, 2, 3]);
        assert_eq!(g.neighbors(99).count(), 0);
    }

    #[test]
    fn test_edges_listed_once() {
        let g = square();
        let edges: Vec<(usize, usize, f64)> = g.edges().collect();
        assert_eq!(edges, vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);
    }

    #[test]
    fn test_connected_components() {
        let mut g = square();
        g.add_vertex(Point2D::new(5.0, 5.0));
        let labels = g.connected_components();
        assert_eq!(labels, vec![0, 0, 0, 0, 1]);
        assert_eq!(g.num_components(), 2);
        assert_eq!(Graph::new().num_components(), 0);
    }

    #[test]
    fn test_path_weight() {
        let g = square();
        let path = Path2D::from_points(g.vertices().to_vec());
        assert!((g.path_weight(&path).unwrap() - 3.0).abs() < 1e-10);
        let broken = Path2D::from_points(vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)]);
        assert!(g.path_weight(&broken).is_err());
    }
}
