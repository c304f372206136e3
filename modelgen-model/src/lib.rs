//! Model graph types for the modelgen pipeline.
//!
//! The generator only needs three things from a model: a type tag per node,
//! child traversal, and a way to group nodes into self-describing entries
//! that can be regenerated independently. This crate provides those types,
//! an explicit [`TypeHierarchy`] used for covariant factory matching, and the
//! [`ModelSource`] trait through which models are loaded.
//!
//! # Architecture
//!
//! ```text
//! model fragments (TOML) → ModelSource (parsing) → ModelGraph → generation driver
//! ```

mod directory;
mod error;
mod graph;
mod node;
mod source;
mod types;

pub use directory::DirectoryModelSource;
pub use error::ModelError;
pub use graph::{ModelEntry, ModelGraph};
pub use node::{Descendants, ModelNode, TEMPLATE_ATTRIBUTE};
pub use source::ModelSource;
pub use types::TypeHierarchy;
