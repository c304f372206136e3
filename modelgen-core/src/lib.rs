//! Core types for the modelgen pipeline.
//!
//! This crate provides the artifact and target-folder types shared by every
//! other modelgen crate, together with the persistence layer that turns an
//! in-memory [`Artifact`] into a file on disk.

mod artifact;
mod file;
mod folder;
mod utils;

// Generated artifacts
pub use artifact::Artifact;
// Persistence
pub use file::{PersistError, PersistResult, Persister, temp_path};
// Target folders
pub use folder::{OverridePolicy, TargetFolder, TargetFolders};
// String utilities
pub use utils::{has_vars, replace_vars};
