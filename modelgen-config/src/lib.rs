//! Configuration for the modelgen pipeline.
//!
//! A `modelgen.toml` file declares where generated artifacts go (target
//! folders and the artifact-kind mapping), the variables substituted into
//! paths and model attributes, where the model and templates live, and how
//! strictly generation errors are treated.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod config;
mod error;

pub use config::{
    CONFIG_FILENAME, Config, FolderConfig, GenerationConfig, ModelConfig, OverrideConfig,
    ProjectConfig,
};
pub use error::{Error, Result, SourceContext};
