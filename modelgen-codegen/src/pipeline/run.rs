//! State of a single generation run.

use eyre::{Result, bail};
use indexmap::IndexMap;
use modelgen_core::PersistResult;
use serde::Serialize;

use crate::references::{ReferenceRegistry, SnippetContext};

/// The pass a factory is being invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Factories register references; nothing is persisted.
    Preparation,
    /// Factories render artifacts, which are persisted.
    Generation,
}

impl Phase {
    /// Short name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preparation => "prepare",
            Phase::Generation => "generate",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Created,
    Preparing,
    Generating,
    Finished,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finished | RunState::Failed)
    }

    fn can_advance_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Created, RunState::Preparing)
                | (RunState::Preparing, RunState::Generating)
                | (RunState::Generating, RunState::Finished)
                | (
                    RunState::Created | RunState::Preparing | RunState::Generating,
                    RunState::Failed
                )
        )
    }
}

/// An artifact handed to persistence (or collected by a preview) in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedArtifact {
    pub kind: String,
    pub path: String,
    /// Model entry the artifact was generated from; `None` for model factories.
    pub entry: Option<String>,
    /// Persistence outcome; `None` in previews.
    pub result: Option<PersistResult>,
}

/// Everything a run shares between factory invocations.
///
/// A new run is created for every driver call, so references and shared
/// values never leak from one run into the next.
#[derive(Debug)]
pub struct GenerationRun {
    state: RunState,
    incremental: bool,
    references: ReferenceRegistry,
    shared: IndexMap<String, serde_json::Value>,
    emitted: Vec<EmittedArtifact>,
}

impl GenerationRun {
    /// Create a run in state [`RunState::Created`].
    pub fn new(incremental: bool) -> Self {
        Self {
            state: RunState::Created,
            incremental,
            references: ReferenceRegistry::new(),
            shared: IndexMap::new(),
            emitted: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The pass factories are currently invoked for.
    pub fn phase(&self) -> Phase {
        match self.state {
            RunState::Created | RunState::Preparing => Phase::Preparation,
            RunState::Generating | RunState::Finished | RunState::Failed => Phase::Generation,
        }
    }

    /// Returns true while factories should only register references.
    pub fn is_preparation(&self) -> bool {
        self.phase() == Phase::Preparation
    }

    /// Returns true if the run regenerates a subset of the model.
    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    /// Move to `next`, rejecting transitions that would re-enter a state.
    pub fn advance(&mut self, next: RunState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            bail!(
                "illegal generation run transition from {:?} to {:?}",
                self.state,
                next
            );
        }
        tracing::debug!("Generation run {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Mark the run failed unless it already ended.
    pub(crate) fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = RunState::Failed;
        }
    }

    /// References registered so far.
    pub fn references(&self) -> &ReferenceRegistry {
        &self.references
    }

    /// Register the fully-qualified name an artifact will have.
    pub fn register_reference(
        &mut self,
        unique: impl Into<String>,
        fqn: impl Into<String>,
    ) -> Option<String> {
        self.references.put(unique, fqn)
    }

    /// A fresh snippet context for one artifact.
    pub fn snippet(&self) -> SnippetContext<'_> {
        SnippetContext::new(&self.references)
    }

    /// A value stored by an earlier factory invocation of this run.
    pub fn shared(&self, key: &str) -> Option<&serde_json::Value> {
        self.shared.get(key)
    }

    /// Store a value for later factory invocations of this run.
    pub fn set_shared(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.shared.insert(key.into(), value.into());
    }

    pub fn shared_mut(&mut self) -> &mut IndexMap<String, serde_json::Value> {
        &mut self.shared
    }

    /// Artifacts emitted so far in the generation pass, in order.
    pub fn emitted(&self) -> &[EmittedArtifact] {
        &self.emitted
    }

    pub(crate) fn record_emitted(&mut self, artifact: EmittedArtifact) {
        self.emitted.push(artifact);
    }
}
