//! Occupancy grid map with precomputed clearance
//!
//! The grid is stored as a `DMatrix<u8>` in image layout: row = y,
//! column = x, nonzero = occupied. Everything derived from it (distance
//! field) is computed once at construction; afterwards the map never changes.

use std::collections::VecDeque;

use itertools::iproduct;
use log::debug;
use nalgebra as na;

use crate::common::{PlannerError, PlannerResult, Point2D};
use crate::mapping::distance_field::{DistanceField, NEIGHBORS_8};

/// Occupancy grid map
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    grid: na::DMatrix<u8>,
    clearance: DistanceField,
    occupied_count: usize,
}

/// Connected components of free space
#[derive(Debug, Clone)]
pub struct FreeRegions {
    width: usize,
    labels: Vec<Option<usize>>,
    count: usize,
}

impl FreeRegions {
    /// Region label of cell `(x, y)`, `None` for occupied or out-of-bounds cells
    pub fn label(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 {
            return None;
        }
        self.labels
            .get(y as usize * self.width + x as usize)
            .copied()
            .flatten()
    }

    /// Region label of the cell containing `p`
    pub fn label_of(&self, p: &Point2D) -> Option<usize> {
        let (x, y) = p.cell();
        self.label(x, y)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl OccupancyMap {
    /// Create an obstacle-free map
    pub fn new(width: usize, height: usize) -> PlannerResult<Self> {
        Self::from_fn(width, height, |_, _| false)
    }

    /// Create a map where `occupied(x, y)` decides every cell
    pub fn from_fn<F>(width: usize, height: usize, occupied: F) -> PlannerResult<Self>
    where
        F: Fn(usize, usize) -> bool,
    {
        if width == 0 || height == 0 {
            return Err(PlannerError::InvalidParameter(format!(
                "map dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let grid = na::DMatrix::from_fn(height, width, |y, x| u8::from(occupied(x, y)));
        Ok(Self::from_grid(grid))
    }

    /// Parse an ASCII map: `#` or `X` is occupied, anything else is free.
    ///
    /// Blank lines are skipped; line `i` of the remaining text is row `y = i`.
    pub fn from_ascii(text: &str) -> PlannerResult<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);

        if let Some((y, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.chars().count() != width)
        {
            return Err(PlannerError::InvalidParameter(format!(
                "row {} has {} cells, expected {}",
                y,
                row.chars().count(),
                width
            )));
        }

        let cells: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| r.chars().map(|c| c == '#' || c == 'X').collect())
            .collect();
        Self::from_fn(width, height, |x, y| cells[y][x])
    }

    /// Build from a coarse matrix (row = y, nonzero = occupied), scaling each
    /// cell into a `scale x scale` block.
    pub fn from_matrix(original_matrix: na::DMatrix<u8>, scale: usize) -> PlannerResult<Self> {
        if scale < 1 {
            return Err(PlannerError::InvalidParameter("scale must be >= 1".to_string()));
        }
        if original_matrix.nrows() == 0 || original_matrix.ncols() == 0 {
            return Err(PlannerError::InvalidParameter("map matrix is empty".to_string()));
        }
        let binary = original_matrix.map(|v| u8::from(v != 0));
        let grid = binary.kronecker(&na::DMatrix::<u8>::repeat(scale, scale, 1));
        Ok(Self::from_grid(grid))
    }

    fn from_grid(grid: na::DMatrix<u8>) -> Self {
        let height = grid.nrows();
        let width = grid.ncols();

        let occupied_count = grid.iter().filter(|&&v| v != 0).count();
        let clearance = DistanceField::exact(width, height, |x, y| grid[(y, x)] != 0);

        debug!(
            "occupancy map {}x{} with {} occupied cells",
            width, height, occupied_count
        );

        OccupancyMap {
            grid,
            clearance,
            occupied_count,
        }
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    /// Whether cell `(x, y)` is inside the map and not occupied
    pub fn is_free_cell(&self, x: i64, y: i64) -> bool {
        self.in_bounds(x, y) && self.grid[(y as usize, x as usize)] == 0
    }

    /// Whether `p` lies within bounds and is not occupied
    pub fn is_free(&self, p: &Point2D) -> bool {
        let (x, y) = p.cell();
        self.is_free_cell(x, y)
    }

    pub fn has_obstacles(&self) -> bool {
        self.occupied_count > 0
    }

    pub fn free_cell_count(&self) -> usize {
        self.width() * self.height() - self.occupied_count
    }

    pub fn occupied_fraction(&self) -> f64 {
        self.occupied_count as f64 / (self.width() * self.height()) as f64
    }

    /// Occupied cells in row-major order
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        iproduct!(0..self.height(), 0..self.width())
            .filter(|&(y, x)| self.grid[(y, x)] != 0)
            .map(|(y, x)| (x as i64, y as i64))
    }

    /// Clearance of cell `(x, y)`: 0 outside the map, infinite when the map
    /// has no obstacles
    pub fn cell_clearance(&self, x: i64, y: i64) -> f64 {
        self.clearance.get(x, y).unwrap_or(0.0)
    }

    /// Distance from `p` to the nearest occupied cell, in grid units.
    ///
    /// Bilinear interpolation of the per-cell field; exact at cell centres.
    pub fn distance_to_obstacle(&self, p: &Point2D) -> f64 {
        let (cx, cy) = p.cell();
        if !self.in_bounds(cx, cy) {
            return 0.0;
        }
        if !self.has_obstacles() {
            return f64::INFINITY;
        }

        let max_x = (self.width() - 1) as f64;
        let max_y = (self.height() - 1) as f64;
        let x = p.x.clamp(0.0, max_x);
        let y = p.y.clamp(0.0, max_y);
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = (x0 + 1.0).min(max_x);
        let y1 = (y0 + 1.0).min(max_y);
        let fx = x - x0;
        let fy = y - y0;

        let value = |xi: f64, yi: f64| self.cell_clearance(xi as i64, yi as i64);
        let bottom = (1.0 - fx) * value(x0, y0) + fx * value(x1, y0);
        let top = (1.0 - fx) * value(x0, y1) + fx * value(x1, y1);
        (1.0 - fy) * bottom + fy * top
    }

    /// Whether the straight segment from `p` to `q` stays in free space
    pub fn line_of_sight(&self, p: &Point2D, q: &Point2D) -> bool {
        let (x0, y0) = p.cell();
        let (x1, y1) = q.cell();
        bresenham(x0, y0, x1, y1)
            .into_iter()
            .all(|(x, y)| self.is_free_cell(x, y))
    }

    /// Label the 8-connected components of free space
    pub fn free_regions(&self) -> FreeRegions {
        let width = self.width();
        let mut labels: Vec<Option<usize>> = vec![None; width * self.height()];
        let mut count = 0;
        let mut queue = VecDeque::new();

        for y in 0..self.height() as i64 {
            for x in 0..width as i64 {
                let idx = y as usize * width + x as usize;
                if labels[idx].is_some() || !self.is_free_cell(x, y) {
                    continue;
                }
                labels[idx] = Some(count);
                queue.push_back((x, y));

                while let Some((cx, cy)) = queue.pop_front() {
                    for &(dx, dy) in &NEIGHBORS_8 {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if !self.is_free_cell(nx, ny) {
                            continue;
                        }
                        let n_idx = ny as usize * width + nx as usize;
                        if labels[n_idx].is_none() {
                            labels[n_idx] = Some(count);
                            queue.push_back((nx, ny));
                        }
                    }
                }
                count += 1;
            }
        }

        FreeRegions { width, labels, count }
    }
}

/// Cells visited by Bresenham's line from `(x0, y0)` to `(x1, y1)`, both ends
/// included
pub(crate) fn bresenham(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
    let mut cells = Vec::new();
    let mut x = x0;
    let mut y = y0;
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = dx - dy;

    loop {
        cells.push((x, y));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_map() -> OccupancyMap {
        OccupancyMap::from_ascii(
            "
            ..........
            ..........
            .....#....
            .....#....
            .....#....
            ..........
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_from_ascii_dimensions() {
        let map = wall_map();
        assert_eq!(map.width(), 10);
        assert_eq!(map.height(), 6);
        assert!(!map.is_free(&Point2D::new(5.0, 3.0)));
        assert!(map.is_free(&Point2D::new(4.0, 3.0)));
        assert!(!map.is_free(&Point2D::new(-1.0, 0.0)));
        assert!(!map.is_free(&Point2D::new(10.0, 0.0)));
    }

    #[test]
    fn test_from_ascii_ragged_rows() {
        let result = OccupancyMap::from_ascii("...\n..\n");
        assert!(matches!(result, Err(PlannerError::InvalidParameter(_))));
    }

    #[test]
    fn test_zero_size_map_rejected() {
        assert!(OccupancyMap::new(0, 5).is_err());
    }

    #[test]
    fn test_from_matrix_scales() {
        let coarse = na::DMatrix::from_row_slice(2, 2, &[0u8, 1, 0, 0]);
        let map = OccupancyMap::from_matrix(coarse, 3).unwrap();
        assert_eq!(map.width(), 6);
        assert_eq!(map.height(), 6);
        // coarse cell (row 0, col 1) covers x in 3..6, y in 0..3
        assert!(!map.is_free_cell(4, 1));
        assert!(map.is_free_cell(1, 1));
        assert!(map.is_free_cell(4, 4));
        assert!(OccupancyMap::from_matrix(na::DMatrix::<u8>::zeros(2, 2), 0).is_err());
    }

    #[test]
    fn test_distance_to_obstacle() {
        let map = wall_map();
        assert_eq!(map.distance_to_obstacle(&Point2D::new(5.0, 3.0)), 0.0);
        assert!((map.distance_to_obstacle(&Point2D::new(2.0, 3.0)) - 3.0).abs() < 1e-10);
        assert!((map.distance_to_obstacle(&Point2D::new(5.0, 0.0)) - 2.0).abs() < 1e-10);
        // halfway between two cells with clearance 3 and 2
        assert!((map.distance_to_obstacle(&Point2D::new(2.5, 3.0)) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_distance_without_obstacles_is_infinite() {
        let map = OccupancyMap::new(4, 4).unwrap();
        assert!(map.distance_to_obstacle(&Point2D::new(1.0, 1.0)).is_infinite());
        assert_eq!(map.distance_to_obstacle(&Point2D::new(-3.0, 1.0)), 0.0);
    }

    #[test]
    fn test_line_of_sight() {
        let map = wall_map();
        assert!(map.line_of_sight(&Point2D::new(0.0, 0.0), &Point2D::new(9.0, 0.0)));
        assert!(!map.line_of_sight(&Point2D::new(0.0, 3.0), &Point2D::new(9.0, 3.0)));
        assert!(map.line_of_sight(&Point2D::new(2.0, 5.0), &Point2D::new(8.0, 5.0)));
        assert!(!map.line_of_sight(&Point2D::new(2.0, 0.0), &Point2D::new(12.0, 0.0)));
    }

    #[test]
    fn test_bresenham_endpoints() {
        let cells = bresenham(0, 0, 4, 2);
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(4, 2)));
        assert_eq!(cells.len(), 5);
        assert_eq!(bresenham(3, 3, 3, 3), vec![(3, 3)]);
    }

    #[test]
    fn test_free_regions() {
        let connected = wall_map().free_regions();
        assert_eq!(connected.count(), 1);

        let split = OccupancyMap::from_fn(7, 5, |x, _| x == 3).unwrap().free_regions();
        assert_eq!(split.count(), 2);
        assert_ne!(split.label(0, 0), split.label(6, 4));
        assert_eq!(split.label(3, 2), None);
        assert_eq!(split.label_of(&Point2D::new(1.0, 1.0)), split.label(0, 0));
    }
}
