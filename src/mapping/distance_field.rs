//! Distance fields over a grid.
//!
//! Two constructions are provided:
//! - [`DistanceField::compute`]: brushfire (multi-source BFS) that also
//!   records which seed is nearest. Propagating the seed itself instead of a
//!   chamfer increment keeps distances Euclidean rather than octile.
//! - [`DistanceField::exact`]: separable squared-distance transform
//!   (Felzenszwalb & Huttenlocher), exact and order independent, without
//!   seed ownership.

use std::collections::VecDeque;

/// 8-connected neighbourhood
pub(crate) const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Per-cell distance to the nearest seed
#[derive(Debug, Clone)]
pub struct DistanceField {
    width: usize,
    height: usize,
    distance: Vec<f64>,
    nearest: Vec<Option<usize>>,
}

impl DistanceField {
    /// Run the brushfire from `seeds`.
    ///
    /// Seeds may lie outside the grid (used for map borders); they then only
    /// initialise their in-bounds neighbours. Only cells for which
    /// `passable(x, y)` holds are expanded into.
    pub fn compute<F>(width: usize, height: usize, seeds: &[(i64, i64)], passable: F) -> Self
    where
        F: Fn(i64, i64) -> bool,
    {
        let total_cells = width * height;
        let mut field = DistanceField {
            width,
            height,
            distance: vec![f64::INFINITY; total_cells],
            nearest: vec![None; total_cells],
        };
        let mut queue = VecDeque::with_capacity(total_cells / 4 + seeds.len());

        for (seed_idx, &(sx, sy)) in seeds.iter().enumerate() {
            if let Some(idx) = field.index(sx, sy) {
                if field.distance[idx] > 0.0 {
                    field.distance[idx] = 0.0;
                    field.nearest[idx] = Some(seed_idx);
                    queue.push_back((sx, sy));
                }
            } else {
                for &(dx, dy) in &NEIGHBORS_8 {
                    let (nx, ny) = (sx + dx, sy + dy);
                    if !passable(nx, ny) {
                        continue;
                    }
                    if let Some(n_idx) = field.index(nx, ny) {
                        let d = Self::euclidean(nx, ny, sx, sy);
                        if d < field.distance[n_idx] {
                            field.distance[n_idx] = d;
                            field.nearest[n_idx] = Some(seed_idx);
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
        }

        while let Some((x, y)) = queue.pop_front() {
            let Some(current_idx) = field.index(x, y) else { continue };
            let Some(seed_idx) = field.nearest[current_idx] else { continue };
            let (sx, sy) = seeds[seed_idx];

            for &(dx, dy) in &NEIGHBORS_8 {
                let (nx, ny) = (x + dx, y + dy);
                let Some(n_idx) = field.index(nx, ny) else { continue };
                if !passable(nx, ny) {
                    continue;
                }
                let d = Self::euclidean(nx, ny, sx, sy);
                if d + 1e-12 < field.distance[n_idx] {
                    field.distance[n_idx] = d;
                    field.nearest[n_idx] = Some(seed_idx);
                    queue.push_back((nx, ny));
                }
            }
        }

        field
    }

    /// Exact Euclidean distance to the nearest cell for which `is_seed` holds
    pub fn exact<F>(width: usize, height: usize, is_seed: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut squared = vec![f64::INFINITY; width * height];
        for y in 0..height {
            for x in 0..width {
                if is_seed(x, y) {
                    squared[y * width + x] = 0.0;
                }
            }
        }

        // columns first, then rows
        for x in 0..width {
            let column: Vec<f64> = (0..height).map(|y| squared[y * width + x]).collect();
            for (y, d) in squared_transform_1d(&column).into_iter().enumerate() {
                squared[y * width + x] = d;
            }
        }
        for y in 0..height {
            let row = squared[y * width..(y + 1) * width].to_vec();
            squared[y * width..(y + 1) * width].copy_from_slice(&squared_transform_1d(&row));
        }

        DistanceField {
            width,
            height,
            distance: squared.into_iter().map(f64::sqrt).collect(),
            nearest: vec![None; width * height],
        }
    }

    /// Distance at cell `(x, y)`, `None` outside the grid
    pub fn get(&self, x: i64, y: i64) -> Option<f64> {
        self.index(x, y).map(|idx| self.distance[idx])
    }

    /// Index of the seed nearest to cell `(x, y)`; always `None` for fields
    /// built with [`DistanceField::exact`]
    pub fn nearest_seed(&self, x: i64, y: i64) -> Option<usize> {
        self.index(x, y).and_then(|idx| self.nearest[idx])
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn euclidean(x1: i64, y1: i64, x2: i64, y2: i64) -> f64 {
        (((x1 - x2).pow(2) + (y1 - y2).pow(2)) as f64).sqrt()
    }
}

/// 1D squared distance transform: lower envelope of parabolas rooted at the
/// finite samples of `f`
fn squared_transform_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let sites: Vec<usize> = (0..n).filter(|&q| f[q].is_finite()).collect();
    let Some((&first, rest)) = sites.split_first() else {
        return vec![f64::INFINITY; n];
    };

    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    let mut envelope = vec![first];
    let mut bounds = vec![f64::NEG_INFINITY, f64::INFINITY];
    for &q in rest {
        let mut s = intersect(q, envelope[envelope.len() - 1]);
        while envelope.len() > 1 && s <= bounds[envelope.len() - 1] {
            envelope.pop();
            bounds.pop();
            s = intersect(q, envelope[envelope.len() - 1]);
        }
        let k = envelope.len();
        envelope.push(q);
        bounds[k] = s;
        bounds.push(f64::INFINITY);
    }

    let mut k = 0;
    (0..n)
        .map(|q| {
            while bounds[k + 1] < q as f64 {
                k += 1;
            }
            let p = envelope[k];
            (q as f64 - p as f64).powi(2) + f[p]
        })
        .collect()
}
