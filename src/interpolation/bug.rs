//! Reactive wall-following navigator (Bug2)
//!
//! The agent walks straight at the current waypoint. When the next step is
//! not traversable it switches to following the obstacle boundary with one
//! hand on the wall, moving cell to cell, until it is back on the line from
//! the leg's start to the waypoint at a point strictly closer than where it
//! hit the obstacle. Traversable cells are free and keep at least the
//! configured clearance from every obstacle, so the wall being followed is
//! the obstacle inflated by that clearance.
//!
//! The two modes form a small state machine:
//!
//! ```text
//!            blocked step                      back on m-line, closer
//!   Direct ---------------> WallFollow ----------------------------> Direct
//!     |                         |
//!     +--> Reached              +--> Stalled(Cycle | Blocked)
//! ```

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{Interpolator, Path2D, PlannerError, PlannerResult, Point2D};
use crate::interpolation::{Refinement, StallCause};
use crate::mapping::OccupancyMap;

// Distance from the m-line at which the follower may leave the wall [cells]
const M_LINE_BAND: f64 = 0.5;
// Default step budget per waypoint, as a multiple of the map's half perimeter
const BUDGET_FACTOR: usize = 20;

/// Which hand the follower keeps on the wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSide {
    Left,
    Right,
    /// Decided at every hit point from the distance gradient
    #[default]
    Auto,
}

/// Configuration for the wall-following navigator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugNavigatorConfig {
    /// Direct-mode step length [cells]
    pub step: f64,
    /// Minimum clearance of a traversable cell [cells]
    pub clearance: f64,
    /// Distance at which a waypoint counts as reached [cells]
    pub tolerance: f64,
    pub side: WallSide,
    /// Step budget per waypoint, 0 derives it from the map size
    pub max_steps: usize,
}

impl Default for BugNavigatorConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            clearance: 2.0,
            tolerance: 1.0,
            side: WallSide::Auto,
            max_steps: 0,
        }
    }
}

impl BugNavigatorConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "bug step must be positive, got {}",
                self.step
            )));
        }
        if !(self.clearance.is_finite() && self.clearance >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "bug clearance must be non-negative, got {}",
                self.clearance
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "bug tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hand {
    Left,
    Right,
}

impl Hand {
    fn opposite(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// 4-connected heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Heading {
    East,
    North,
    West,
    South,
}

impl Heading {
    fn delta(self) -> (i64, i64) {
        match self {
            Heading::East => (1, 0),
            Heading::North => (0, 1),
            Heading::West => (-1, 0),
            Heading::South => (0, -1),
        }
    }

    fn turn(self, hand: Hand) -> Self {
        match (self, hand) {
            (Heading::East, Hand::Left) => Heading::North,
            (Heading::North, Hand::Left) => Heading::West,
            (Heading::West, Hand::Left) => Heading::South,
            (Heading::South, Hand::Left) => Heading::East,
            (Heading::East, Hand::Right) => Heading::South,
            (Heading::North, Hand::Right) => Heading::East,
            (Heading::West, Hand::Right) => Heading::North,
            (Heading::South, Hand::Right) => Heading::West,
        }
    }

    fn back(self) -> Self {
        self.turn(Hand::Left).turn(Hand::Left)
    }

    /// Dominant and secondary axis headings of the direction `(dx, dy)`
    fn toward(dx: f64, dy: f64) -> (Self, Self) {
        let horizontal = if dx >= 0.0 { Heading::East } else { Heading::West };
        let vertical = if dy >= 0.0 { Heading::North } else { Heading::South };
        if dx.abs() >= dy.abs() {
            (horizontal, vertical)
        } else {
            (vertical, horizontal)
        }
    }

    fn step_from(self, (x, y): (i64, i64)) -> Point2D {
        let (dx, dy) = self.delta();
        Point2D::from_cell(x + dx, y + dy)
    }
}

/// Boundary-following state
#[derive(Debug, Clone)]
struct Follow {
    hit: Point2D,
    hit_distance: f64,
    hand: Hand,
    heading: Heading,
    seen: HashSet<((i64, i64), Heading)>,
}

#[derive(Debug, Clone)]
enum Mode {
    Direct,
    WallFollow(Follow),
}

/// Outcome of one transition
#[derive(Debug)]
enum NavState {
    Running(Mode),
    Reached,
    Stalled(StallCause),
}

/// One waypoint-to-waypoint run
struct Leg<'a> {
    map: &'a OccupancyMap,
    from: Point2D,
    target: Point2D,
}

/// Wall-following navigator
#[derive(Debug, Clone, Default)]
pub struct BugNavigator {
    config: BugNavigatorConfig,
}

impl BugNavigator {
    pub fn new(config: BugNavigatorConfig) -> Self {
        BugNavigator { config }
    }

    pub fn config(&self) -> &BugNavigatorConfig {
        &self.config
    }

    /// A point is traversable when it is free and keeps the clearance; the
    /// waypoint's own cell only needs to be free
    fn traversable(&self, map: &OccupancyMap, p: &Point2D, target: &Point2D) -> bool {
        if !map.is_free(p) {
            return false;
        }
        let (x, y) = p.cell();
        p.cell() == target.cell() || map.cell_clearance(x, y) >= self.config.clearance
    }

    fn direct_step(&self, pos: &Point2D, target: &Point2D) -> Point2D {
        let dist = pos.distance(target);
        if dist <= self.config.step {
            return *target;
        }
        Point2D::from(pos.to_vector() + (target.to_vector() - pos.to_vector()) * (self.config.step / dist))
    }

    /// Hand to keep on the wall at `pos`. For `Auto` the boundary tangent
    /// (distance gradient rotated by 90 degrees) that points more towards
    /// the target wins.
    fn choose_hand(&self, map: &OccupancyMap, pos: &Point2D, target: &Point2D) -> Hand {
        match self.config.side {
            WallSide::Left => Hand::Left,
            WallSide::Right => Hand::Right,
            WallSide::Auto => {
                let h = 0.5;
                let d = |dx: f64, dy: f64| map.distance_to_obstacle(&Point2D::new(pos.x + dx, pos.y + dy));
                let gx = d(h, 0.0) - d(-h, 0.0);
                let gy = d(0.0, h) - d(0.0, -h);
                if !(gx.is_finite() && gy.is_finite()) {
                    return Hand::Left;
                }
                let (tx, ty) = (target.x - pos.x, target.y - pos.y);
                // obstacle on the left when moving along (-gy, gx)
                let left = -gy * tx + gx * ty;
                let right = gy * tx - gx * ty;
                if right > left {
                    Hand::Right
                } else {
                    Hand::Left
                }
            }
        }
    }

    /// Signed distance of `p` from the leg's m-line
    fn m_line_offset(leg: &Leg, p: &Point2D) -> f64 {
        let line = leg.target.to_vector() - leg.from.to_vector();
        let rel = p.to_vector() - leg.from.to_vector();
        let len = line.norm();
        if len == 0.0 {
            return rel.norm();
        }
        (line.x * rel.y - line.y * rel.x) / len
    }

    fn may_leave(&self, leg: &Leg, prev: &Point2D, pos: &Point2D, follow: &Follow) -> bool {
        let before = Self::m_line_offset(leg, prev);
        let now = Self::m_line_offset(leg, pos);
        let on_line = now.abs() <= M_LINE_BAND || before * now < 0.0;
        let closer = pos.distance(&leg.target) < follow.hit_distance - 1e-9;
        on_line
            && closer
            && self.traversable(leg.map, &self.direct_step(pos, &leg.target), &leg.target)
    }

    fn transition(&self, leg: &Leg, pos: &mut Point2D, trace: &mut Vec<Point2D>, mode: Mode) -> NavState {
        if pos.distance(&leg.target) <= self.config.tolerance {
            return NavState::Reached;
        }

        match mode {
            Mode::Direct => {
                let next = self.direct_step(pos, &leg.target);
                if self.traversable(leg.map, &next, &leg.target) {
                    *pos = next;
                    trace.push(next);
                    return NavState::Running(Mode::Direct);
                }

                let cell = pos.cell();
                let blocked = |h: Heading| !self.traversable(leg.map, &h.step_from(cell), &leg.target);
                let (primary, secondary) = Heading::toward(leg.target.x - pos.x, leg.target.y - pos.y);
                let facing = if blocked(primary) {
                    primary
                } else if blocked(secondary) {
                    secondary
                } else {
                    // only the diagonal is blocked: sidestep along the main axis
                    *pos = primary.step_from(cell);
                    trace.push(*pos);
                    return NavState::Running(Mode::Direct);
                };

                let hand = self.choose_hand(leg.map, pos, &leg.target);
                debug!(
                    "bug: hit at ({:.2}, {:.2}), following with {:?} hand",
                    pos.x, pos.y, hand
                );
                NavState::Running(Mode::WallFollow(Follow {
                    hit: *pos,
                    hit_distance: pos.distance(&leg.target),
                    hand,
                    heading: facing.turn(hand.opposite()),
                    seen: HashSet::new(),
                }))
            }
            Mode::WallFollow(mut follow) => {
                let cell = pos.cell();
                if !follow.seen.insert((cell, follow.heading)) {
                    debug!(
                        "bug: boundary cycle after hit at ({:.2}, {:.2})",
                        follow.hit.x, follow.hit.y
                    );
                    return NavState::Stalled(StallCause::Cycle);
                }

                let heading = follow.heading;
                let candidates = [
                    heading.turn(follow.hand),
                    heading,
                    heading.turn(follow.hand.opposite()),
                    heading.back(),
                ];
                let Some(next_heading) = candidates
                    .into_iter()
                    .find(|h| self.traversable(leg.map, &h.step_from(cell), &leg.target))
                else {
                    return NavState::Stalled(StallCause::Blocked);
                };

                let prev = *pos;
                *pos = next_heading.step_from(cell);
                trace.push(*pos);
                follow.heading = next_heading;

                if self.may_leave(leg, &prev, pos, &follow) {
                    debug!("bug: leaving wall at ({:.2}, {:.2})", pos.x, pos.y);
                    return NavState::Running(Mode::Direct);
                }
                NavState::Running(Mode::WallFollow(follow))
            }
        }
    }

    /// Drive from `from` to `target`, appending every position to `trace`.
    /// Returns the arrival point, or where and why the leg stalled.
    fn run_leg(
        &self,
        map: &OccupancyMap,
        from: Point2D,
        target: Point2D,
        trace: &mut Vec<Point2D>,
    ) -> Result<Point2D, (Point2D, StallCause)> {
        let budget = if self.config.max_steps == 0 {
            BUDGET_FACTOR * (map.width() + map.height())
        } else {
            self.config.max_steps
        };
        let leg = Leg { map, from, target };
        let mut pos = from;
        let mut mode = Mode::Direct;

        for _ in 0..=budget {
            match self.transition(&leg, &mut pos, trace, mode) {
                NavState::Running(next) => mode = next,
                NavState::Reached => {
                    if pos != target && map.is_free(&target) {
                        trace.push(target);
                        return Ok(target);
                    }
                    return Ok(pos);
                }
                NavState::Stalled(cause) => return Err((pos, cause)),
            }
        }
        Err((pos, StallCause::IterationLimit))
    }
}

impl Interpolator for BugNavigator {
    fn refine(&self, map: &OccupancyMap, path: &Path2D) -> Refinement {
        let Some((&start, waypoints)) = path.points.split_first() else {
            return Refinement::no_input();
        };

        let mut trace = vec![start];
        let mut pos = start;
        for &waypoint in waypoints {
            match self.run_leg(map, pos, waypoint, &mut trace) {
                Ok(arrival) => pos = arrival,
                Err((at, cause)) => {
                    debug!("bug: stalled at ({:.2}, {:.2}): {:?}", at.x, at.y, cause);
                    return Refinement::stalled(Path2D::from_points(trace), at, cause);
                }
            }
        }
        Refinement::complete(Path2D::from_points(trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::RefineOutcome;

    fn straight(a: (f64, f64), b: (f64, f64)) -> Path2D {
        Path2D::from_points(vec![Point2D::new(a.0, a.1), Point2D::new(b.0, b.1)])
    }

    /// 40x30 map with a 10x10 block between (5, 15) and (35, 15)
    fn block_map() -> OccupancyMap {
        OccupancyMap::from_fn(40, 30, |x, y| (15..25).contains(&x) && (10..20).contains(&y)).unwrap()
    }

    #[test]
    fn test_free_map_goes_straight() {
        let map = OccupancyMap::new(10, 10).unwrap();
        let refined = BugNavigator::default().refine(&map, &straight((0.0, 0.0), (5.0, 0.0)));
        assert!(refined.is_complete());
        let xs = refined.path.x_coords();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_goes_around_block_with_either_hand() {
        let map = block_map();
        for side in [WallSide::Left, WallSide::Right, WallSide::Auto] {
            let navigator = BugNavigator::new(BugNavigatorConfig {
                side,
                ..Default::default()
            });
            let refined = navigator.refine(&map, &straight((5.0, 15.0), (35.0, 15.0)));
            assert!(refined.is_complete(), "{:?}: {:?}", side, refined.outcome);
            assert!(refined.path.points.iter().all(|p| map.is_free(p)));
            assert_eq!(refined.path.last(), Some(&Point2D::new(35.0, 15.0)));
            // left hand passes below the block, right hand above
            match side {
                WallSide::Right => assert!(refined.path.points.iter().any(|p| p.y > 20.0)),
                _ => assert!(refined.path.points.iter().any(|p| p.y < 9.0)),
            }
        }
    }

    #[test]
    fn test_unreachable_goal_is_a_cycle() {
        // goal inside a closed square ring
        let map = OccupancyMap::from_fn(30, 30, |x, y| {
            let on_x = (10..=20).contains(&x) && (y == 10 || y == 20);
            let on_y = (10..=20).contains(&y) && (x == 10 || x == 20);
            on_x || on_y
        })
        .unwrap();
        let refined = BugNavigator::default().refine(&map, &straight((3.0, 15.0), (15.0, 15.0)));
        assert!(matches!(
            refined.outcome,
            RefineOutcome::Stalled { cause: StallCause::Cycle, .. }
        ));
        assert!(refined.path.points.iter().all(|p| map.is_free(p)));
    }

    #[test]
    fn test_boxed_in_start_is_blocked() {
        let map = OccupancyMap::from_fn(9, 9, |x, y| {
            ((2..=6).contains(&x) && (y == 2 || y == 6)) || ((2..=6).contains(&y) && (x == 2 || x == 6))
        })
        .unwrap();
        let refined = BugNavigator::default().refine(&map, &straight((4.0, 4.0), (8.0, 8.0)));
        assert!(matches!(
            refined.outcome,
            RefineOutcome::Stalled { cause: StallCause::Blocked, .. }
        ));
    }

    #[test]
    fn test_step_budget() {
        let map = block_map();
        let navigator = BugNavigator::new(BugNavigatorConfig {
            max_steps: 5,
            ..Default::default()
        });
        let refined = navigator.refine(&map, &straight((5.0, 15.0), (35.0, 15.0)));
        assert!(matches!(
            refined.outcome,
            RefineOutcome::Stalled { cause: StallCause::IterationLimit, .. }
        ));
    }

    #[test]
    fn test_auto_hand_faces_goal() {
        let map = OccupancyMap::from_fn(40, 30, |x, y| x == 15 && (5..=25).contains(&y)).unwrap();
        let navigator = BugNavigator::default();
        let pos = Point2D::new(12.0, 18.0);
        assert_eq!(navigator.choose_hand(&map, &pos, &Point2D::new(35.0, 25.0)), Hand::Right);
        assert_eq!(navigator.choose_hand(&map, &pos, &Point2D::new(35.0, 10.0)), Hand::Left);
    }

    #[test]
    fn test_visits_every_waypoint() {
        let map = OccupancyMap::new(12, 12).unwrap();
        let path = Path2D::from_points(vec![
            Point2D::new(1.0, 1.0),
            Point2D::new(8.0, 1.0),
            Point2D::new(8.0, 8.0),
        ]);
        let refined = BugNavigator::default().refine(&map, &path);
        assert!(refined.is_complete());
        assert!(refined.path.points.contains(&Point2D::new(8.0, 1.0)));
        assert_eq!(refined.path.last(), Some(&Point2D::new(8.0, 8.0)));
    }

    #[test]
    fn test_headings() {
        assert_eq!(Heading::East.turn(Hand::Left), Heading::North);
        assert_eq!(Heading::East.turn(Hand::Right), Heading::South);
        assert_eq!(Heading::North.back(), Heading::South);
        assert_eq!(Heading::toward(-3.0, 1.0), (Heading::West, Heading::North));
        assert_eq!(Heading::toward(0.5, -2.0), (Heading::South, Heading::East));
    }
}
