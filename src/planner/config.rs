//! Planner configuration
//!
//! Three independent slots, each defaulting to its no-op variant:
//!
//! ```toml
//! [roadmap_builder]
//! kind = "probabilistic"
//! n = 200
//! seed = 7
//!
//! [graph_search]
//! kind = "a_star"
//! metric = "euclidean"
//!
//! [interpolator]
//! kind = "bug"
//! side = "left"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult};
use crate::graph_search::SearchKind;
use crate::interpolation::InterpolatorKind;
use crate::roadmap::{ProbabilisticRoadMapConfig, RoadmapKind, VoronoiRoadMapConfig};

/// Strategy selection for a [`crate::planner::Planner`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub roadmap_builder: RoadmapKind,
    pub graph_search: SearchKind,
    pub interpolator: InterpolatorKind,
}

impl PlannerConfig {
    pub fn new(
        roadmap_builder: RoadmapKind,
        graph_search: SearchKind,
        interpolator: InterpolatorKind,
    ) -> Self {
        Self {
            roadmap_builder,
            graph_search,
            interpolator,
        }
    }

    /// Voronoi roadmap, Dijkstra search, no interpolation
    pub fn voronoi() -> Self {
        Self::new(
            RoadmapKind::Voronoi(VoronoiRoadMapConfig::default()),
            SearchKind::Dijkstra,
            InterpolatorKind::None,
        )
    }

    /// Automatically sized PRM, Dijkstra search, no interpolation
    pub fn prm() -> Self {
        Self::new(
            RoadmapKind::Probabilistic(ProbabilisticRoadMapConfig::default()),
            SearchKind::Dijkstra,
            InterpolatorKind::None,
        )
    }

    /// Parse a TOML document. Unknown strategy kinds are `Config` errors.
    pub fn from_toml_str(text: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Check every strategy's parameters
    pub fn validate(&self) -> PlannerResult<()> {
        self.roadmap_builder.validate()?;
        self.graph_search.validate()?;
        self.interpolator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Metric;
    use crate::interpolation::{BugNavigatorConfig, WallSide};

    #[test]
    fn test_empty_document_is_all_no_op() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.roadmap_builder, RoadmapKind::None);
        assert_eq!(config.graph_search, SearchKind::None);
        assert_eq!(config.interpolator, InterpolatorKind::None);
    }

    #[test]
    fn test_parse_full_document() {
        let text = r#"
            [roadmap_builder]
            kind = "probabilistic"
            n = 200
            seed = 7

            [graph_search]
            kind = "a_star"
            metric = "manhattan"

            [interpolator]
            kind = "bug"
            side = "left"
            clearance = 1.5
        "#;
        let config = PlannerConfig::from_toml_str(text).unwrap();
        match &config.roadmap_builder {
            RoadmapKind::Probabilistic(prm) => {
                assert_eq!(prm.n, 200);
                assert_eq!(prm.seed, Some(7));
                assert_eq!(prm.max_batches, 10);
            }
            other => panic!("unexpected builder {:?}", other),
        }
        match &config.graph_search {
            SearchKind::AStar(a_star) => {
                assert_eq!(a_star.metric, Metric::Manhattan);
                assert_eq!(a_star.weight, 1.0);
            }
            other => panic!("unexpected search {:?}", other),
        }
        assert_eq!(
            config.interpolator,
            InterpolatorKind::Bug(BugNavigatorConfig {
                side: WallSide::Left,
                clearance: 1.5,
                ..Default::default()
            })
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unit_variants() {
        let config = PlannerConfig::from_toml_str(
            "[graph_search]\nkind = \"bidirectional_breadth_first\"\n",
        )
        .unwrap();
        assert_eq!(config.graph_search, SearchKind::BidirectionalBreadthFirst);
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let err = PlannerConfig::from_toml_str("[roadmap_builder]\nkind = \"visibility\"\n").unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn test_presets() {
        assert!(matches!(PlannerConfig::voronoi().roadmap_builder, RoadmapKind::Voronoi(_)));
        assert!(matches!(
            PlannerConfig::prm().roadmap_builder,
            RoadmapKind::Probabilistic(ProbabilisticRoadMapConfig { n: 0, .. })
        ));
        assert_eq!(PlannerConfig::prm().graph_search, SearchKind::Dijkstra);
        assert!(PlannerConfig::voronoi().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PlannerConfig::load(Path::new("/nonexistent/planner.toml")).unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }
}
