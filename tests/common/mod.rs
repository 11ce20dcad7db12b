//! Map fixtures shared by the integration tests

#![allow(dead_code)]

use rust_motion_planning::graph_search::AStarConfig;
use rust_motion_planning::{OccupancyMap, Point2D, ProblemDefinition, SearchKind};

pub fn init_logger() {
    env_logger::builder().is_test(true).try_init().ok();
}

pub fn pdef(start: (f64, f64), goal: (f64, f64)) -> ProblemDefinition {
    ProblemDefinition::new(Point2D::new(start.0, start.1), Point2D::new(goal.0, goal.1))
}

/// 40x30 map with a 10x10 block on the line from (5, 15) to (35, 15)
pub fn block_map() -> OccupancyMap {
    OccupancyMap::from_fn(40, 30, |x, y| (15..25).contains(&x) && (10..20).contains(&y)).unwrap()
}

/// 41x41 funnel, mirror-symmetric about y = 20, with a block centred on that
/// line between (5, 20) and (35, 20)
pub fn funnel_map() -> OccupancyMap {
    OccupancyMap::from_fn(41, 41, |x, y| {
        y.min(40 - y) < x / 4 || ((18..=22).contains(&x) && (17..=23).contains(&y))
    })
    .unwrap()
}

/// 20x10 map split by a solid wall at x = 10
pub fn wall_map() -> OccupancyMap {
    OccupancyMap::from_fn(20, 10, |x, _| x == 10).unwrap()
}

/// Two rooms joined by a door, with a pillar in the left room
pub fn rooms_map() -> OccupancyMap {
    OccupancyMap::from_fn(30, 20, |x, y| {
        (x == 15 && !(8..=11).contains(&y)) || ((5..=8).contains(&x) && (4..=6).contains(&y))
    })
    .unwrap()
}

/// The five searches that actually use the graph
pub fn graph_searches() -> Vec<SearchKind> {
    vec![
        SearchKind::Dijkstra,
        SearchKind::AStar(AStarConfig::default()),
        SearchKind::BreadthFirst,
        SearchKind::BidirectionalBreadthFirst,
        SearchKind::DepthFirst,
    ]
}
