//! Common types used throughout rust_motion_planning

use nalgebra::Vector2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// 2D point in workspace (grid) coordinates.
///
/// The centre of grid cell `(i, j)` sits at `(i as f64, j as f64)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Grid cell containing this point
    pub fn cell(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    /// Centre of grid cell `(i, j)`
    pub fn from_cell(i: i64, j: i64) -> Self {
        Self { x: i as f64, y: j as f64 }
    }

    /// Hashable key with exact-equality semantics
    pub(crate) fn key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
        (OrderedFloat(self.x), OrderedFloat(self.y))
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Path represented as a sequence of 2D points, start to goal inclusive.
///
/// An empty path is the explicit "no path found" value.
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    /// Number of segments
    pub fn hop_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}

/// Start/goal pair for a single query.
///
/// Not validated: callers pick points in free space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemDefinition {
    pub start: Point2D,
    pub goal: Point2D,
}

impl ProblemDefinition {
    pub fn new(start: Point2D, goal: Point2D) -> Self {
        Self { start, goal }
    }
}

/// Distance functions between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// sqrt((x2-x1)^2 + (y2-y1)^2)
    #[default]
    Euclidean,
    /// |x2-x1| + |y2-y1|
    Manhattan,
    /// max(|x2-x1|, |y2-y1|)
    Chebyshev,
}

impl Metric {
    pub fn distance(&self, a: &Point2D, b: &Point2D) -> f64 {
        let dx = (b.x - a.x).abs();
        let dy = (b.y - a.y).abs();
        match self {
            Metric::Euclidean => (dx * dx + dy * dy).sqrt(),
            Metric::Manhattan => dx + dy,
            Metric::Chebyshev => dx.max(dy),
        }
    }
}
