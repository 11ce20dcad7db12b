//! Error types for rust_motion_planning
//!
//! Only programming and configuration failures are errors. "No path" and
//! "navigation stalled" are ordinary outcomes and are reported through
//! empty paths and [`crate::interpolation::RefineOutcome`] instead.

use thiserror::Error;

/// Main error type for the planning pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// A parameter is outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A query point was never registered as a roadmap vertex
    #[error("No vertex registered at ({x}, {y})")]
    UnknownVertex { x: f64, y: f64 },

    /// A vertex index past the end of the graph
    #[error("Vertex index {index} out of range for graph with {len} vertices")]
    VertexOutOfRange { index: usize, len: usize },

    /// `solve` was called before a workspace was loaded
    #[error("No workspace loaded")]
    NoWorkspace,

    /// Malformed or unknown configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

/// Result type alias for planning operations
pub type PlannerResult<T> = Result<T, PlannerError>;
