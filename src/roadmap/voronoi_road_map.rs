//! Generalized Voronoi road-map construction
//!
//! The diagram is approximated on the grid:
//! 1. obstacle contours, simplified to within `eps` and rasterized, and the
//!    four map borders become labelled generators,
//! 2. a labelled brushfire assigns every free cell its nearest generator,
//! 3. free cells where two different obstacles meet form the ridge; ridge
//!    cells below the safety clearance are dropped,
//! 4. the ridge is thinned to a one-cell skeleton and cut into chains
//!    between junctions and ends; short dangling chains are pruned,
//! 5. each chain is simplified into straight, collision-free segments which
//!    become the graph edges.

use std::collections::{BTreeSet, HashSet, VecDeque};

use itertools::iproduct;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult, Point2D, RoadmapBuilder};
use crate::mapping::distance_field::NEIGHBORS_8;
use crate::mapping::occupancy_map::bresenham;
use crate::mapping::{DistanceField, OccupancyMap};
use crate::roadmap::{Graph, Roadmap};

// Douglas-Peucker tolerance for chain simplification [cells]
const SIMPLIFY_TOLERANCE: f64 = 1.0;

type Cell = (i64, i64);

/// Configuration for the Voronoi road-map builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiRoadMapConfig {
    /// Maximum deviation of the simplified obstacle contours from the real
    /// boundary [cells]
    pub eps: f64,
    /// Minimum obstacle clearance of a roadmap cell [cells]
    pub clearance: f64,
    /// Dangling chains shorter than this are pruned [cells]
    pub min_spur_length: f64,
}

impl Default for VoronoiRoadMapConfig {
    fn default() -> Self {
        Self {
            eps: 10.0,
            clearance: 2.0,
            min_spur_length: 3.0,
        }
    }
}

impl VoronoiRoadMapConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "voronoi eps must be positive, got {}",
                self.eps
            )));
        }
        if !(self.clearance.is_finite() && self.clearance >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "voronoi clearance must be non-negative, got {}",
                self.clearance
            )));
        }
        if !(self.min_spur_length.is_finite() && self.min_spur_length >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "voronoi min_spur_length must be non-negative, got {}",
                self.min_spur_length
            )));
        }
        Ok(())
    }
}

/// Voronoi road-map builder
#[derive(Debug, Clone, Default)]
pub struct VoronoiRoadMap {
    config: VoronoiRoadMapConfig,
}

/// A grid-sized boolean mask
struct Mask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Mask {
    fn new(width: usize, height: usize) -> Self {
        Mask {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    fn set(&mut self, x: i64, y: i64, value: bool) {
        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            self.cells[y as usize * self.width + x as usize] = value;
        }
    }

    fn iter_set(&self) -> impl Iterator<Item = Cell> + '_ {
        iproduct!(0..self.height as i64, 0..self.width as i64)
            .map(|(y, x)| (x, y))
            .filter(|&(x, y)| self.get(x, y))
    }

    fn neighbors(&self, (x, y): Cell) -> Vec<Cell> {
        NEIGHBORS_8
            .iter()
            .map(|&(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| self.get(nx, ny))
            .collect()
    }

    fn degree(&self, cell: Cell) -> usize {
        self.neighbors(cell).len()
    }

    fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

impl VoronoiRoadMap {
    pub fn new(config: VoronoiRoadMapConfig) -> Self {
        VoronoiRoadMap { config }
    }

    pub fn config(&self) -> &VoronoiRoadMapConfig {
        &self.config
    }

    /// Generator cells and their labels: one label per 8-connected obstacle,
    /// then left, right, bottom and top border.
    ///
    /// Each obstacle contributes every cell along the edges of its contours
    /// simplified to within `eps`.
    fn generators(&self, map: &OccupancyMap) -> (Vec<Cell>, Vec<usize>) {
        let (width, height) = (map.width() as i64, map.height() as i64);
        let obstacle_labels = Self::label_obstacles(map);
        let obstacle_count = obstacle_labels
            .iter()
            .flatten()
            .max()
            .map_or(0, |&max_label| max_label + 1);
        let label_at = |x: i64, y: i64| -> Option<usize> {
            if !map.in_bounds(x, y) {
                return None;
            }
            obstacle_labels[(y * width + x) as usize]
        };

        let mut traced: HashSet<Cell> = HashSet::new();
        let mut kept: Vec<BTreeSet<Cell>> = vec![BTreeSet::new(); obstacle_count];
        let mut contours = 0;
        for (x, y) in map.occupied_cells() {
            if traced.contains(&(x, y)) {
                continue;
            }
            let Some(label) = label_at(x, y) else { continue };
            // a free 4-neighbour marks a contour cell not covered yet
            let Some(back) = [0, 2, 4, 6].into_iter().find(|&d| {
                let (dx, dy) = MOORE[d];
                map.is_free_cell(x + dx, y + dy)
            }) else {
                continue;
            };

            let contour = trace_contour((x, y), back, |cx, cy| label_at(cx, cy) == Some(label));
            traced.extend(contour.iter().copied());
            let corners = simplify_closed(&contour, self.config.eps);
            match corners.as_slice() {
                [single] => {
                    kept[label].insert(*single);
                }
                _ => {
                    for pair in corners.windows(2) {
                        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                        kept[label].extend(
                            bresenham(x0, y0, x1, y1)
                                .into_iter()
                                .filter(|&(cx, cy)| map.in_bounds(cx, cy)),
                        );
                    }
                }
            }
            contours += 1;
        }

        let mut seeds = Vec::new();
        let mut labels = Vec::new();
        for (label, cells) in kept.into_iter().enumerate() {
            labels.extend(std::iter::repeat(label).take(cells.len()));
            seeds.extend(cells);
        }

        let borders: [Vec<Cell>; 4] = [
            (0..height).map(|y| (-1, y)).collect(),
            (0..height).map(|y| (width, y)).collect(),
            (0..width).map(|x| (x, -1)).collect(),
            (0..width).map(|x| (x, height)).collect(),
        ];
        for (side, cells) in borders.into_iter().enumerate() {
            labels.extend(std::iter::repeat(obstacle_count + side).take(cells.len()));
            seeds.extend(cells);
        }

        debug!(
            "voronoi generators: {} cells over {} obstacles, {} contours",
            seeds.len(),
            obstacle_count,
            contours
        );
        (seeds, labels)
    }

    /// 8-connected components of occupied cells, row-major index
    fn label_obstacles(map: &OccupancyMap) -> Vec<Option<usize>> {
        let width = map.width() as i64;
        let mut labels = vec![None; map.width() * map.height()];
        let mut next_label = 0;
        let mut queue = VecDeque::new();

        for (x, y) in map.occupied_cells() {
            if labels[(y * width + x) as usize].is_some() {
                continue;
            }
            labels[(y * width + x) as usize] = Some(next_label);
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                for &(dx, dy) in &NEIGHBORS_8 {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !map.in_bounds(nx, ny) || map.is_free_cell(nx, ny) {
                        continue;
                    }
                    let idx = (ny * width + nx) as usize;
                    if labels[idx].is_none() {
                        labels[idx] = Some(next_label);
                        queue.push_back((nx, ny));
                    }
                }
            }
            next_label += 1;
        }

        labels
    }

    /// Free cells bordering a cell owned by a different generator label.
    ///
    /// Of each differing pair the cell farther from its generator is marked,
    /// which keeps the ridge about one cell wide.
    fn ridge(&self, map: &OccupancyMap, field: &DistanceField, labels: &[usize]) -> Mask {
        let mut mask = Mask::new(map.width(), map.height());
        let label_at = |x: i64, y: i64| field.nearest_seed(x, y).map(|s| labels[s]);

        for y in 0..map.height() as i64 {
            for x in 0..map.width() as i64 {
                if !map.is_free_cell(x, y) {
                    continue;
                }
                let Some(own) = label_at(x, y) else { continue };
                for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                    if !map.is_free_cell(nx, ny) {
                        continue;
                    }
                    let Some(other) = label_at(nx, ny) else { continue };
                    if other == own {
                        continue;
                    }
                    let d_own = field.get(x, y).unwrap_or(0.0);
                    let d_other = field.get(nx, ny).unwrap_or(0.0);
                    if d_own >= d_other {
                        mask.set(x, y, true);
                    } else {
                        mask.set(nx, ny, true);
                    }
                }
            }
        }

        let candidates = mask.count();
        let unsafe_cells: Vec<Cell> = mask
            .iter_set()
            .filter(|&(x, y)| map.cell_clearance(x, y) < self.config.clearance)
            .collect();
        for (x, y) in unsafe_cells {
            mask.set(x, y, false);
        }
        debug!(
            "voronoi ridge: {} cells, {} kept after clearance filter",
            candidates,
            mask.count()
        );
        mask
    }

    /// Zhang-Suen thinning down to a one-cell-wide 8-connected skeleton
    fn thin(mask: &mut Mask) {
        loop {
            let mut changed = false;
            for pass in 0..2 {
                let removable: Vec<Cell> = mask
                    .iter_set()
                    .filter(|&(x, y)| {
                        // P2..P9, clockwise from north
                        let p = [
                            mask.get(x, y - 1),
                            mask.get(x + 1, y - 1),
                            mask.get(x + 1, y),
                            mask.get(x + 1, y + 1),
                            mask.get(x, y + 1),
                            mask.get(x - 1, y + 1),
                            mask.get(x - 1, y),
                            mask.get(x - 1, y - 1),
                        ];
                        let b = p.iter().filter(|&&v| v).count();
                        let a = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
                        if !(2..=6).contains(&b) || a != 1 {
                            return false;
                        }
                        let (p2, p4, p6, p8) = (p[0], p[2], p[4], p[6]);
                        if pass == 0 {
                            !(p2 && p4 && p6) && !(p4 && p6 && p8)
                        } else {
                            !(p2 && p4 && p8) && !(p2 && p6 && p8)
                        }
                    })
                    .collect();
                changed |= !removable.is_empty();
                for (x, y) in removable {
                    mask.set(x, y, false);
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Cut the skeleton into chains running between nodes (cells whose
    /// degree is not 2). Closed loops without nodes start anywhere.
    fn trace_chains(mask: &Mask) -> Vec<Vec<Cell>> {
        let mut steps: HashSet<(Cell, Cell)> = HashSet::new();
        let mut chains = Vec::new();

        let walk = |start: Cell, first: Cell, steps: &mut HashSet<(Cell, Cell)>| {
            let mut chain = vec![start, first];
            steps.insert((start, first));
            steps.insert((first, start));
            let (mut prev, mut cur) = (start, first);
            while mask.degree(cur) == 2 {
                let next = mask
                    .neighbors(cur)
                    .into_iter()
                    .find(|&n| n != prev && !steps.contains(&(cur, n)));
                let Some(n) = next else { break };
                steps.insert((cur, n));
                steps.insert((n, cur));
                chain.push(n);
                prev = cur;
                cur = n;
            }
            chain
        };

        let nodes: Vec<Cell> = mask.iter_set().filter(|&c| mask.degree(c) != 2).collect();
        for &node in &nodes {
            for n in mask.neighbors(node) {
                if !steps.contains(&(node, n)) {
                    chains.push(walk(node, n, &mut steps));
                }
            }
        }

        let loop_cells: Vec<Cell> = mask.iter_set().filter(|&c| mask.degree(c) == 2).collect();
        for cell in loop_cells {
            if let Some(n) = mask
                .neighbors(cell)
                .into_iter()
                .find(|&n| !steps.contains(&(cell, n)))
            {
                chains.push(walk(cell, n, &mut steps));
            }
        }

        chains
    }

    /// Drop dangling chains shorter than `min_spur_length`
    fn prune_spurs(&self, mask: &Mask, chains: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
        chains
            .into_iter()
            .filter(|chain| {
                let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
                    return false;
                };
                let dangling = mask.degree(head) <= 1 || mask.degree(tail) <= 1;
                !dangling || chain_length(chain) >= self.config.min_spur_length
            })
            .collect()
    }

    /// Douglas-Peucker simplification that additionally splits every
    /// segment without line of sight
    fn simplify(chain: &[Cell], map: &OccupancyMap) -> Vec<Cell> {
        if chain.len() < 2 {
            return chain.to_vec();
        }
        let mut keep = vec![0, chain.len() - 1];
        let visible = |a: Cell, b: Cell| map.line_of_sight(&to_point(a), &to_point(b));
        split(chain, 0, chain.len() - 1, SIMPLIFY_TOLERANCE, &visible, &mut keep);
        keep.sort_unstable();
        keep.dedup();
        keep.into_iter().map(|i| chain[i]).collect()
    }
}

impl RoadmapBuilder for VoronoiRoadMap {
    fn build(&self, map: &OccupancyMap) -> PlannerResult<Roadmap> {
        self.config.validate()?;

        let (seeds, labels) = self.generators(map);
        let field = DistanceField::compute(map.width(), map.height(), &seeds, |x, y| {
            map.is_free_cell(x, y)
        });

        let mut skeleton = self.ridge(map, &field, &labels);
        Self::thin(&mut skeleton);
        let chains = self.prune_spurs(&skeleton, Self::trace_chains(&skeleton));

        let mut graph = Graph::new();
        for chain in &chains {
            let points: Vec<Point2D> = Self::simplify(chain, map).into_iter().map(to_point).collect();
            for pair in points.windows(2) {
                let i = graph.add_vertex(pair[0]);
                let j = graph.add_vertex(pair[1]);
                graph.add_edge(i, j, pair[0].distance(&pair[1]))?;
            }
        }

        info!(
            "voronoi roadmap: {} skeleton cells, {} chains, {} vertices, {} edges",
            skeleton.count(),
            chains.len(),
            graph.num_vertices(),
            graph.num_edges()
        );
        Ok(Roadmap::complete(graph))
    }
}

/// Moore neighbourhood in rotation order, 4-neighbours at even indices
const MOORE: [Cell; 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Moore-neighbour contour tracing.
///
/// Starts at `start` with `MOORE[back]` a background neighbour and walks the
/// boundary of the foreground component until a (cell, backtrack) state
/// repeats. Returns the contour cells in walking order.
fn trace_contour<F>(start: Cell, back: usize, is_foreground: F) -> Vec<Cell>
where
    F: Fn(i64, i64) -> bool,
{
    let mut contour = vec![start];
    let mut seen = HashSet::from([(start, back)]);
    let (mut cur, mut back) = (start, back);

    loop {
        let found = (1..8).map(|k| (back + k) % 8).find(|&d| {
            let (dx, dy) = MOORE[d];
            is_foreground(cur.0 + dx, cur.1 + dy)
        });
        // isolated cell
        let Some(d) = found else { break };

        let (dx, dy) = MOORE[d];
        let next = (cur.0 + dx, cur.1 + dy);
        let (bx, by) = MOORE[(d + 7) % 8];
        let offset = (cur.0 + bx - next.0, cur.1 + by - next.1);
        let Some(next_back) = MOORE.iter().position(|&m| m == offset) else { break };

        if !seen.insert((next, next_back)) {
            break;
        }
        contour.push(next);
        cur = next;
        back = next_back;
    }

    contour
}

/// Douglas-Peucker simplification of a closed contour. The result starts
/// and ends at `contour[0]`; a single-cell contour stays a single cell.
fn simplify_closed(contour: &[Cell], tolerance: f64) -> Vec<Cell> {
    let Some(&first) = contour.first() else {
        return Vec::new();
    };
    if contour.len() == 1 {
        return vec![first];
    }

    let mut ring = contour.to_vec();
    ring.push(first);
    let last = ring.len() - 1;
    let origin = to_point(first);
    let far = (1..last)
        .max_by(|&a, &b| {
            let da = origin.distance(&to_point(ring[a]));
            let db = origin.distance(&to_point(ring[b]));
            da.total_cmp(&db)
        })
        .unwrap_or(last);

    let always = |_: Cell, _: Cell| true;
    let mut keep = vec![0, far, last];
    split(&ring, 0, far, tolerance, &always, &mut keep);
    split(&ring, far, last, tolerance, &always, &mut keep);
    keep.sort_unstable();
    keep.dedup();
    keep.into_iter().map(|i| ring[i]).collect()
}

/// Douglas-Peucker step on `chain[lo..=hi]`: a segment is kept when every
/// point between its ends lies within `tolerance` and `accept` holds for it
fn split(
    chain: &[Cell],
    lo: usize,
    hi: usize,
    tolerance: f64,
    accept: &dyn Fn(Cell, Cell) -> bool,
    keep: &mut Vec<usize>,
) {
    if hi <= lo + 1 {
        return;
    }
    let (a, b) = (to_point(chain[lo]), to_point(chain[hi]));
    let (mut idx, mut d_max) = (lo + 1, -1.0);
    for (i, &c) in chain.iter().enumerate().take(hi).skip(lo + 1) {
        let d = point_segment_distance(&to_point(c), &a, &b);
        if d > d_max {
            idx = i;
            d_max = d;
        }
    }
    if d_max <= tolerance && accept(chain[lo], chain[hi]) {
        return;
    }
    if d_max <= 0.0 {
        idx = (lo + hi) / 2;
    }
    keep.push(idx);
    split(chain, lo, idx, tolerance, accept, keep);
    split(chain, idx, hi, tolerance, accept, keep);
}

fn to_point((x, y): Cell) -> Point2D {
    Point2D::from_cell(x, y)
}

fn chain_length(chain: &[Cell]) -> f64 {
    chain
        .windows(2)
        .map(|w| to_point(w[0]).distance(&to_point(w[1])))
        .sum()
}

/// Distance from `p` to segment `ab` (to the point `a` if degenerate)
fn point_segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let ab = b.to_vector() - a.to_vector();
    let ap = p.to_vector() - a.to_vector();
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return ap.norm();
    }
    let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
    (ap - ab * t).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> OccupancyMap {
        OccupancyMap::from_fn(30, 11, |_, y| y == 0 || y == 10).unwrap()
    }

    fn mask_from(width: usize, height: usize, cells: &[Cell]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(x, y) in cells {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn test_corridor_follows_centre_line() {
        let builder = VoronoiRoadMap::new(VoronoiRoadMapConfig {
            eps: 1.0,
            ..Default::default()
        });
        let roadmap = builder.build(&corridor()).unwrap();
        let g = &roadmap.graph;
        assert!(g.num_edges() > 0);

        let crosses_middle = g.edges().any(|(i, j, _)| {
            let (a, b) = (g.vertex(i).unwrap(), g.vertex(j).unwrap());
            a.x.min(b.x) <= 15.0
                && a.x.max(b.x) >= 15.0
                && (4.0..=6.0).contains(&a.y)
                && (4.0..=6.0).contains(&b.y)
        });
        assert!(crosses_middle);
    }

    #[test]
    fn test_edges_keep_line_of_sight_and_clearance() {
        let map = OccupancyMap::from_fn(40, 30, |x, y| {
            ((8..14).contains(&x) && (5..20).contains(&y))
                || ((22..30).contains(&x) && (12..26).contains(&y))
                || (x == 35 && y < 10)
        })
        .unwrap();
        let roadmap = VoronoiRoadMap::default().build(&map).unwrap();
        let g = &roadmap.graph;
        assert!(g.num_vertices() > 0);
        for (i, j, w) in g.edges() {
            let (a, b) = (g.vertex(i).unwrap(), g.vertex(j).unwrap());
            assert!(map.line_of_sight(&a, &b));
            assert!((w - a.distance(&b)).abs() < 1e-10);
        }
        for v in g.vertices() {
            assert!(map.distance_to_obstacle(v) >= 2.0);
        }
    }

    #[test]
    fn test_fully_occupied_map_is_empty() {
        let map = OccupancyMap::from_fn(6, 6, |_, _| true).unwrap();
        let roadmap = VoronoiRoadMap::default().build(&map).unwrap();
        assert!(roadmap.graph.is_empty());
    }

    /// Occupied cell with a free 4-neighbour
    fn touches_free(map: &OccupancyMap, (x, y): Cell) -> bool {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|&(dx, dy)| map.is_free_cell(x + dx, y + dy))
    }

    fn obstacle_generators(
        builder: &VoronoiRoadMap,
        map: &OccupancyMap,
        label: usize,
    ) -> HashSet<Cell> {
        let (seeds, labels) = builder.generators(map);
        seeds
            .into_iter()
            .zip(labels)
            .filter(|&(_, l)| l == label)
            .map(|(c, _)| c)
            .collect()
    }

    fn with_eps(eps: f64) -> VoronoiRoadMap {
        VoronoiRoadMap::new(VoronoiRoadMapConfig {
            eps,
            ..Default::default()
        })
    }

    #[test]
    fn test_straight_wall_stays_whole_at_any_eps() {
        let map = OccupancyMap::from_fn(40, 5, |_, y| y == 0).unwrap();
        for eps in [0.5, 10.0, 100.0] {
            let wall = obstacle_generators(&with_eps(eps), &map, 0);
            assert_eq!(wall, (0..40).map(|x| (x, 0)).collect::<HashSet<Cell>>());
        }
        // borders: 5 + 5 + 40 + 40 cells with labels 1..=4
        let (seeds, labels) = with_eps(10.0).generators(&map);
        assert_eq!(seeds.len(), 40 + 90);
        assert_eq!(labels.iter().max(), Some(&4));
    }

    #[test]
    fn test_generators_follow_contour_within_eps() {
        let map = OccupancyMap::from_fn(20, 20, |x, y| {
            (5..15).contains(&x) && (5..15).contains(&y)
        })
        .unwrap();
        let boundary: HashSet<Cell> = map
            .occupied_cells()
            .filter(|&(x, y)| touches_free(&map, (x, y)))
            .collect();
        assert_eq!(boundary.len(), 36);

        assert_eq!(obstacle_generators(&with_eps(0.5), &map, 0), boundary);

        let coarse = obstacle_generators(&with_eps(100.0), &map, 0);
        assert!(!coarse.is_empty());
        assert!(coarse.len() < boundary.len());
        for &(x, y) in &coarse {
            let nearest = boundary
                .iter()
                .map(|&b| to_point(b).distance(&to_point((x, y))))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest <= 100.0);
            assert!(!map.is_free_cell(x, y));
        }
    }

    #[test]
    fn test_hole_contour_is_traced() {
        // two-cell-thick square ring around a free hole
        let map = OccupancyMap::from_fn(16, 16, |x, y| {
            let outer = (2..=13).contains(&x) && (2..=13).contains(&y);
            let hole = (4..=11).contains(&x) && (4..=11).contains(&y);
            outer && !hole
        })
        .unwrap();
        let generators = obstacle_generators(&with_eps(0.5), &map, 0);
        for (x, y) in map.occupied_cells() {
            if touches_free(&map, (x, y)) {
                assert!(generators.contains(&(x, y)), "missing generator ({}, {})", x, y);
            }
        }
        assert!(generators.contains(&(4, 3)));
        assert!(generators.contains(&(12, 7)));
    }

    #[test]
    fn test_trace_contour_single_cell_and_bar() {
        let single = trace_contour((3, 3), 0, |x, y| (x, y) == (3, 3));
        assert_eq!(single, vec![(3, 3)]);

        let bar = trace_contour((0, 0), 2, |x, y| y == 0 && (0..5).contains(&x));
        let cells: HashSet<Cell> = bar.iter().copied().collect();
        assert_eq!(cells.len(), 5);
        assert_eq!(simplify_closed(&bar, 1.0).first(), Some(&(0, 0)));
        assert!(simplify_closed(&bar, 1.0).contains(&(4, 0)));
    }

    #[test]
    fn test_default_roadmap_crosses_door() {
        // wall at x = 15 with a door at y 8..=11, plus a block in the left room
        let map = OccupancyMap::from_fn(30, 20, |x, y| {
            (x == 15 && !(8..=11).contains(&y)) || ((5..=8).contains(&x) && (4..=6).contains(&y))
        })
        .unwrap();
        assert_eq!(map.free_regions().count(), 1);

        let roadmap = VoronoiRoadMap::default().build(&map).unwrap();
        let g = &roadmap.graph;
        assert_eq!(g.num_components(), 1);
        // edges keep line of sight, so spanning x = 15 means passing the door
        let crosses_door = g.edges().any(|(i, j, _)| {
            let (a, b) = (g.vertex(i).unwrap(), g.vertex(j).unwrap());
            a.x != b.x && a.x.min(b.x) <= 15.0 && a.x.max(b.x) >= 15.0
        });
        assert!(crosses_door);
    }

    #[test]
    fn test_thin_keeps_line_and_reduces_block() {
        let line: Vec<Cell> = (0..8).map(|x| (x, 2)).collect();
        let mut mask = mask_from(10, 5, &line);
        VoronoiRoadMap::thin(&mut mask);
        assert_eq!(mask.count(), 8);

        let block: Vec<Cell> = (0..10).flat_map(|x| (1..4).map(move |y| (x, y))).collect();
        let mut thick = mask_from(10, 5, &block);
        VoronoiRoadMap::thin(&mut thick);
        assert!(thick.count() < block.len());
        assert!(thick.count() > 0);
    }

    #[test]
    fn test_trace_and_prune_spur() {
        // horizontal line with a two-cell spur going up from the middle
        let mut cells: Vec<Cell> = (0..=20).map(|x| (x, 5)).collect();
        cells.extend([(10, 6), (10, 7)]);
        let mask = mask_from(21, 10, &cells);
        let chains = VoronoiRoadMap::trace_chains(&mask);

        let covered: HashSet<Cell> = chains.iter().flatten().copied().collect();
        assert_eq!(covered.len(), cells.len());

        let builder = VoronoiRoadMap::default();
        let pruned = builder.prune_spurs(&mask, chains);
        assert!(pruned.iter().all(|c| !c.contains(&(10, 7))));
        assert!(pruned.iter().any(|c| c.contains(&(0, 5))));
        assert!(pruned.iter().any(|c| c.contains(&(20, 5))));
    }

    #[test]
    fn test_trace_closed_loop() {
        // diamond: every cell has exactly two 8-neighbours
        let ring: Vec<Cell> = vec![(2, 0), (3, 1), (4, 2), (3, 3), (2, 4), (1, 3), (0, 2), (1, 1)];
        let mask = mask_from(5, 5, &ring);
        let chains = VoronoiRoadMap::trace_chains(&mask);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].first(), chains[0].last());
        assert_eq!(chains[0].len(), ring.len() + 1);
    }

    #[test]
    fn test_simplify_splits_around_obstacle() {
        let map = OccupancyMap::from_fn(10, 10, |x, y| x == 4 && y <= 2).unwrap();
        // L-shaped chain going around the obstacle tip
        let chain: Vec<Cell> = vec![(2, 1), (2, 2), (2, 3), (3, 4), (4, 4), (5, 3), (6, 2), (6, 1)];
        let simplified = VoronoiRoadMap::simplify(&chain, &map);
        assert_eq!(simplified.first(), Some(&(2, 1)));
        assert_eq!(simplified.last(), Some(&(6, 1)));
        for w in simplified.windows(2) {
            assert!(map.line_of_sight(&to_point(w[0]), &to_point(w[1])));
        }

        let straight: Vec<Cell> = (0..6).map(|x| (x, 8)).collect();
        assert_eq!(VoronoiRoadMap::simplify(&straight, &map), vec![(0, 8), (5, 8)]);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(4.0, 0.0);
        assert!((point_segment_distance(&Point2D::new(2.0, 3.0), &a, &b) - 3.0).abs() < 1e-10);
        assert!((point_segment_distance(&Point2D::new(-3.0, 4.0), &a, &b) - 5.0).abs() < 1e-10);
        assert!((point_segment_distance(&Point2D::new(1.0, 1.0), &a, &a) - 2f64.sqrt()).abs() < 1e-10);
    }
}
