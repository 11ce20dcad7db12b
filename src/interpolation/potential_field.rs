//! Potential-field descent
//!
//! The agent follows the negative gradient of an attractive bowl around the
//! waypoint plus a repulsive term near obstacles, one fixed-length step at a
//! time. Gradients are central finite differences of the potential, so the
//! map is only touched through `distance_to_obstacle` and `is_free`.

use std::collections::VecDeque;

use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::{Interpolator, Path2D, PlannerError, PlannerResult, Point2D};
use crate::interpolation::{Refinement, StallCause};
use crate::mapping::OccupancyMap;

// Floor for the obstacle distance in the repulsive term
const MIN_DISTANCE: f64 = 0.1;
// Gradient norm below which the field is considered flat
const FLAT_GRADIENT: f64 = 1e-9;

/// Configuration for potential-field descent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialFieldConfig {
    /// Attractive potential gain
    pub attractive_gain: f64,
    /// Repulsive potential gain
    pub repulsive_gain: f64,
    /// Obstacle distance beyond which there is no repulsion [cells]
    pub influence_radius: f64,
    /// Step length [cells]
    pub step: f64,
    /// Distance at which a waypoint counts as reached [cells]
    pub tolerance: f64,
    /// Step budget per waypoint
    pub max_iterations: usize,
    /// Number of steps used to check for stagnation
    pub stagnation_window: usize,
    /// Finite-difference half width [cells]
    pub gradient_delta: f64,
}

impl Default for PotentialFieldConfig {
    fn default() -> Self {
        Self {
            attractive_gain: 1.0,
            repulsive_gain: 100.0,
            influence_radius: 5.0,
            step: 0.5,
            tolerance: 1.0,
            max_iterations: 5000,
            stagnation_window: 10,
            gradient_delta: 0.5,
        }
    }
}

impl PotentialFieldConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        let positive = [
            ("attractive_gain", self.attractive_gain),
            ("repulsive_gain", self.repulsive_gain),
            ("influence_radius", self.influence_radius),
            ("step", self.step),
            ("tolerance", self.tolerance),
            ("gradient_delta", self.gradient_delta),
        ];
        if let Some((name, value)) = positive
            .iter()
            .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        {
            return Err(PlannerError::InvalidParameter(format!(
                "potential field {} must be positive, got {}",
                name, value
            )));
        }
        if self.max_iterations == 0 || self.stagnation_window == 0 {
            return Err(PlannerError::InvalidParameter(
                "potential field max_iterations and stagnation_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Steepest-descent navigator on an attractive/repulsive potential
#[derive(Debug, Clone, Default)]
pub struct PotentialField {
    config: PotentialFieldConfig,
}

impl PotentialField {
    pub fn new(config: PotentialFieldConfig) -> Self {
        PotentialField { config }
    }

    pub fn config(&self) -> &PotentialFieldConfig {
        &self.config
    }

    fn calc_attractive_potential(&self, p: &Point2D, goal: &Point2D) -> f64 {
        let d = p.distance(goal);
        0.5 * self.config.attractive_gain * d * d
    }

    /// Repulsion from occupied cells. Points outside the map take the
    /// clearance of the nearest point inside it, so the border itself does
    /// not repel.
    fn calc_repulsive_potential(&self, map: &OccupancyMap, p: &Point2D) -> f64 {
        let max_x = map.width().saturating_sub(1) as f64;
        let max_y = map.height().saturating_sub(1) as f64;
        let inside = Point2D::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y));
        let d = map.distance_to_obstacle(&inside).max(MIN_DISTANCE);
        if d < self.config.influence_radius {
            0.5 * self.config.repulsive_gain * (1.0 / d - 1.0 / self.config.influence_radius).powi(2)
        } else {
            0.0
        }
    }

    /// Total potential at `p` when steering to `goal`
    pub fn potential(&self, map: &OccupancyMap, p: &Point2D, goal: &Point2D) -> f64 {
        self.calc_attractive_potential(p, goal) + self.calc_repulsive_potential(map, p)
    }

    fn gradient(&self, map: &OccupancyMap, p: &Point2D, goal: &Point2D) -> Vector2<f64> {
        let h = self.config.gradient_delta;
        let u = |dx: f64, dy: f64| self.potential(map, &Point2D::new(p.x + dx, p.y + dy), goal);
        Vector2::new(
            (u(h, 0.0) - u(-h, 0.0)) / (2.0 * h),
            (u(0.0, h) - u(0.0, -h)) / (2.0 * h),
        )
    }

    /// Record `pos` and report whether the net displacement over the last
    /// `stagnation_window` steps is shorter than a single step
    fn stagnation_detection(&self, recent: &mut VecDeque<Point2D>, pos: Point2D) -> bool {
        recent.push_back(pos);
        if recent.len() > self.config.stagnation_window + 1 {
            recent.pop_front();
        }
        if recent.len() <= self.config.stagnation_window {
            return false;
        }
        match (recent.front(), recent.back()) {
            (Some(oldest), Some(newest)) => oldest.distance(newest) < self.config.step,
            _ => false,
        }
    }

    fn descend(
        &self,
        map: &OccupancyMap,
        from: Point2D,
        goal: Point2D,
        trace: &mut Vec<Point2D>,
    ) -> Result<Point2D, (Point2D, StallCause)> {
        let mut pos = from;
        let mut recent = VecDeque::with_capacity(self.config.stagnation_window + 1);
        recent.push_back(pos);

        for iteration in 0..=self.config.max_iterations {
            if pos.distance(&goal) <= self.config.tolerance {
                debug!("potential field: reached waypoint after {} steps", iteration);
                if pos != goal && map.is_free(&goal) {
                    trace.push(goal);
                    return Ok(goal);
                }
                return Ok(pos);
            }
            if iteration == self.config.max_iterations {
                break;
            }

            let grad = self.gradient(map, &pos, &goal);
            let norm = grad.norm();
            if !(norm >= FLAT_GRADIENT) {
                return Err((pos, StallCause::LocalMinimum));
            }
            let next = Point2D::from(pos.to_vector() - grad * (self.config.step / norm));
            if !map.is_free(&next) {
                return Err((pos, StallCause::Blocked));
            }

            pos = next;
            trace.push(pos);
            if self.stagnation_detection(&mut recent, pos) {
                return Err((pos, StallCause::LocalMinimum));
            }
        }
        Err((pos, StallCause::IterationLimit))
    }
}

impl Interpolator for PotentialField {
    fn refine(&self, map: &OccupancyMap, path: &Path2D) -> Refinement {
        let Some((&start, waypoints)) = path.points.split_first() else {
            return Refinement::no_input();
        };

        let mut trace = vec![start];
        let mut pos = start;
        for &waypoint in waypoints {
            match self.descend(map, pos, waypoint, &mut trace) {
                Ok(arrival) => pos = arrival,
                Err((at, cause)) => {
                    debug!(
                        "potential field: stalled at ({:.2}, {:.2}) after {} positions: {:?}",
                        at.x,
                        at.y,
                        trace.len(),
                        cause
                    );
                    return Refinement::stalled(Path2D::from_points(trace), at, cause);
                }
            }
        }
        Refinement::complete(Path2D::from_points(trace))
    }
}
