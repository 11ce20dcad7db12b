// Planner demo: runs several strategy combinations on a built-in map and
// prints the result as ASCII art.
//
//   RUST_LOG=info cargo run --example planner_demo

use rust_motion_planning::interpolation::{BugNavigatorConfig, PotentialFieldConfig};
use rust_motion_planning::roadmap::ProbabilisticRoadMapConfig;
use rust_motion_planning::{
    InterpolatorKind, OccupancyMap, Path2D, Planner, PlannerConfig, PlannerResult, Point2D,
    ProblemDefinition, RoadmapKind, SearchKind,
};

const MAP: &str = "
    ........................................
    ........................................
    ........................................
    ..........#####.........................
    ..........#####.............######......
    ..........#####.............######......
    ..........#####.............######......
    ..........#####.........................
    ..........#####.........................
    ........................................
    ........................................
    ....................########............
    ....................########............
    ....................########............
    ........................................
    ........................................
    ........................................
    ........................................
    ";

fn render(map: &OccupancyMap, pdef: &ProblemDefinition, path: &Path2D) -> String {
    let mut rows: Vec<Vec<char>> = (0..map.height())
        .map(|y| {
            (0..map.width())
                .map(|x| if map.is_free_cell(x as i64, y as i64) { '.' } else { '#' })
                .collect()
        })
        .collect();

    let mut mark = |p: &Point2D, c: char| {
        let (x, y) = p.cell();
        if map.in_bounds(x, y) {
            rows[y as usize][x as usize] = c;
        }
    };
    for p in &path.points {
        mark(p, '*');
    }
    mark(&pdef.start, 'S');
    mark(&pdef.goal, 'G');

    rows.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> PlannerResult<()> {
    env_logger::init();

    let map = OccupancyMap::from_ascii(MAP)?;
    let pdef = ProblemDefinition::new(Point2D::new(2.0, 5.0), Point2D::new(37.0, 13.0));

    let setups = vec![
        ("voronoi + dijkstra", PlannerConfig::voronoi()),
        (
            "prm + a* (seed 7)",
            PlannerConfig::new(
                RoadmapKind::Probabilistic(ProbabilisticRoadMapConfig {
                    seed: Some(7),
                    ..Default::default()
                }),
                SearchKind::AStar(Default::default()),
                InterpolatorKind::None,
            ),
        ),
        (
            "bug navigator",
            PlannerConfig::new(
                RoadmapKind::None,
                SearchKind::None,
                InterpolatorKind::Bug(BugNavigatorConfig {
                    clearance: 1.0,
                    ..Default::default()
                }),
            ),
        ),
        (
            "potential field",
            PlannerConfig::new(
                RoadmapKind::None,
                SearchKind::None,
                InterpolatorKind::PotentialField(PotentialFieldConfig::default()),
            ),
        ),
    ];

    for (name, config) in setups {
        let mut planner = Planner::new(config)?;
        planner.load_workspace(map.clone().into());
        let report = planner.solve_report(&pdef)?;

        println!("== {} ==", name);
        println!(
            "outcome: {:?}, roadmap: {:?}, length: {:.2}",
            report.outcome,
            report.quality,
            report.path.total_length()
        );
        println!("{}\n", render(&map, &pdef, &report.trace));
    }

    Ok(())
}
