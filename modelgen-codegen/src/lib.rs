//! Two-pass model-to-text generation for modelgen.
//!
//! This crate walks a [`ModelGraph`](modelgen_model::ModelGraph), hands each
//! node to the artifact factories registered for its type, and persists the
//! resulting artifacts. Generation runs in two passes so artifacts can refer
//! to each other's fully-qualified names before those artifacts exist.
//!
//! # Module Organization
//!
//! - [`references`] - Reference registry and per-artifact snippet context
//! - [`factory`] - Factory traits and the type-matching factory registry
//! - [`pipeline`] - Generation run, driver, diagnostics and run report
//! - [`incremental`] - Template dependency tracking and minimal regeneration
//! - [`templates`] - Template engine abstraction (Tera-backed by default)
//! - [`factories`] - Built-in factories (parameterized templates, listings)

pub mod factories;
pub mod factory;
pub mod incremental;
pub mod pipeline;
pub mod references;
pub mod templates;

pub use factories::{ListingFactory, TargetFile, TargetFileListProducer, TemplateFactory};
pub use factory::{ArtifactFactory, FactoryRegistry, ModelFactory};
pub use incremental::{DependencyEdge, DependencyTracker};
pub use pipeline::{ErrorPolicy, GenerationRun, Generator, Phase, RunReport, RunState, RunStatus};
pub use references::{ReferenceEntry, ReferenceRegistry, SnippetContext};
pub use templates::{TemplateEngine, TeraEngine};
