//! Artifact factories and their registry.

mod registry;
mod traits;

pub use registry::FactoryRegistry;
pub use traits::{ArtifactFactory, ModelFactory};
