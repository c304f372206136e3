//! Incremental regeneration.

mod tracker;

pub use tracker::{DependencyEdge, DependencyTracker};
