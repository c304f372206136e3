//! Generation pipeline.
//!
//! The [`Generator`] runs the registered factories over a model in two
//! passes and hands the resulting artifacts to persistence:
//!
//! 1. **Preparation**: every node factory, then every model factory, is
//!    invoked so it can register the names its artifacts will have.
//! 2. **Generation**: the same traversal again, this time rendering and
//!    persisting artifacts against the fully populated reference registry.
//!
//! Per-run state lives in a [`GenerationRun`], and the outcome is summarized
//! in a [`RunReport`].

mod diagnostic;
mod report;
mod run;
mod runner;

pub use diagnostic::{Diagnostic, Severity};
pub use report::{FileOutcome, RunReport, RunStatus};
pub use run::{EmittedArtifact, GenerationRun, Phase, RunState};
pub use runner::{ErrorPolicy, Generator};
