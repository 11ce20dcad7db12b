//! Probabilistic Road-Map (PRM) construction
//!
//! Samples distinct free cells and joins every pair of samples that can see
//! each other. When the resulting graph has more components than the free
//! regions it samples, more samples are added in batches until it does not
//! or the batch cap is hit; in the latter case the roadmap is reported as
//! [`RoadmapQuality::Degraded`].

use std::collections::HashSet;

use itertools::iproduct;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::{PlannerResult, Point2D, RoadmapBuilder};
use crate::mapping::OccupancyMap;
use crate::roadmap::{Graph, Roadmap, RoadmapQuality};

// Auto sample count heuristic
const CELLS_PER_SAMPLE: f64 = 25.0;
const DENSITY_FACTOR: f64 = 4.0;
const MIN_AUTO_SAMPLES: usize = 20;
const MAX_AUTO_SAMPLES: usize = 1000;
const MIN_BATCH: usize = 10;

/// Configuration for the PRM builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilisticRoadMapConfig {
    /// Number of samples, 0 derives it from the map
    pub n: usize,
    /// Fixed seed for reproducible roadmaps, `None` draws from entropy
    pub seed: Option<u64>,
    /// Resampling batches allowed while the roadmap is disconnected
    pub max_batches: usize,
}

impl Default for ProbabilisticRoadMapConfig {
    fn default() -> Self {
        Self {
            n: 0,
            seed: None,
            max_batches: 10,
        }
    }
}

/// PRM builder
#[derive(Debug, Clone)]
pub struct ProbabilisticRoadMap {
    config: ProbabilisticRoadMapConfig,
}

impl ProbabilisticRoadMap {
    pub fn new(config: ProbabilisticRoadMapConfig) -> Self {
        ProbabilisticRoadMap { config }
    }

    pub fn config(&self) -> &ProbabilisticRoadMapConfig {
        &self.config
    }

    /// Sample count for `map`: the configured `n`, or the automatic count
    pub fn sample_count(&self, map: &OccupancyMap) -> usize {
        if self.config.n == 0 {
            Self::auto_sample_count(map)
        } else {
            self.config.n.min(map.free_cell_count())
        }
    }

    /// `clamp(ceil(free / 25 * (1 + 4 * occupied_fraction)), 20, 1000)`,
    /// never more than the free cells available
    pub fn auto_sample_count(map: &OccupancyMap) -> usize {
        let free = map.free_cell_count();
        let raw = (free as f64 / CELLS_PER_SAMPLE * (1.0 + DENSITY_FACTOR * map.occupied_fraction()))
            .ceil() as usize;
        raw.clamp(MIN_AUTO_SAMPLES, MAX_AUTO_SAMPLES).min(free)
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Draw up to `count` free cells not sampled yet
    fn sample_points(
        map: &OccupancyMap,
        rng: &mut ChaCha8Rng,
        taken: &mut HashSet<(i64, i64)>,
        count: usize,
    ) -> Vec<Point2D> {
        let candidates: Vec<(i64, i64)> = iproduct!(0..map.height() as i64, 0..map.width() as i64)
            .map(|(y, x)| (x, y))
            .filter(|&(x, y)| map.is_free_cell(x, y) && !taken.contains(&(x, y)))
            .collect();

        let chosen: Vec<(i64, i64)> = candidates.choose_multiple(rng, count).copied().collect();
        taken.extend(chosen.iter().copied());
        chosen
            .into_iter()
            .map(|(x, y)| Point2D::from_cell(x, y))
            .collect()
    }

    /// Join every vertex at index `>= first_new` to every lower-indexed
    /// vertex it can see
    fn connect(graph: &mut Graph, map: &OccupancyMap, first_new: usize) -> PlannerResult<()> {
        let vertices = graph.vertices().to_vec();
        let edges: Vec<Vec<(usize, usize, f64)>> = (first_new..vertices.len())
            .into_par_iter()
            .map(|j| {
                (0..j)
                    .filter(|&i| map.line_of_sight(&vertices[i], &vertices[j]))
                    .map(|i| (i, j, vertices[i].distance(&vertices[j])))
                    .collect()
            })
            .collect();

        for (i, j, w) in edges.into_iter().flatten() {
            graph.add_edge(i, j, w)?;
        }
        Ok(())
    }

    /// `(graph components, free regions touched by samples)`
    fn connectivity(graph: &Graph, map: &OccupancyMap) -> (usize, usize) {
        let regions = map.free_regions();
        let touched: HashSet<usize> = graph
            .vertices()
            .iter()
            .filter_map(|p| regions.label_of(p))
            .collect();
        (graph.num_components(), touched.len())
    }
}

impl RoadmapBuilder for ProbabilisticRoadMap {
    fn build(&self, map: &OccupancyMap) -> PlannerResult<Roadmap> {
        let n = self.sample_count(map);
        let mut rng = self.rng();
        let mut taken = HashSet::new();
        let mut graph = Graph::new();

        for p in Self::sample_points(map, &mut rng, &mut taken, n) {
            graph.add_vertex(p);
        }
        Self::connect(&mut graph, map, 0)?;

        let batch_size = (n / 2).max(MIN_BATCH);
        let mut batches = 0;
        let (mut components, mut regions) = Self::connectivity(&graph, map);

        while components > regions && batches < self.config.max_batches {
            let first_new = graph.num_vertices();
            let extra = Self::sample_points(map, &mut rng, &mut taken, batch_size);
            if extra.is_empty() {
                break;
            }
            for p in extra {
                graph.add_vertex(p);
            }
            Self::connect(&mut graph, map, first_new)?;
            batches += 1;
            (components, regions) = Self::connectivity(&graph, map);
            debug!(
                "prm batch {}: {} vertices, {} components over {} regions",
                batches,
                graph.num_vertices(),
                components,
                regions
            );
        }

        info!(
            "prm roadmap: {} vertices, {} edges, {} batches",
            graph.num_vertices(),
            graph.num_edges(),
            batches
        );

        if components > regions {
            warn!(
                "prm roadmap still has {} components over {} free regions after {} batches",
                components, regions, batches
            );
            return Ok(Roadmap {
                graph,
                quality: RoadmapQuality::Degraded {
                    components,
                    regions,
                    batches,
                },
            });
        }

        Ok(Roadmap::complete(graph))
    }
}

impl Default for ProbabilisticRoadMap {
    fn default() -> Self {
        Self::new(ProbabilisticRoadMapConfig::default())
    }
}
