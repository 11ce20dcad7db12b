//! Common types, traits, and error definitions for rust_motion_planning
//!
//! This module provides the foundational building blocks shared by every
//! stage of the planning pipeline.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
