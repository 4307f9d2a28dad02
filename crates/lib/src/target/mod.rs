//! Named targets and the dependency graph between them.
//!
//! # Submodules
//!
//! - [`graph`] - DAG construction, cycle detection and execution order
//! - `types` - target definitions and the standard target table

pub mod graph;
mod types;

pub use graph::TargetGraph;
pub use types::*;
