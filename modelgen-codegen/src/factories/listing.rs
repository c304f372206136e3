use eyre::Result;
use modelgen_core::Artifact;
use modelgen_model::ModelGraph;

use crate::{factory::ModelFactory, pipeline::GenerationRun};

/// Writes one file listing every artifact emitted earlier in the run.
///
/// Only a full run sees every artifact, so the factory is skipped by
/// incremental runs.
#[derive(Debug, Clone)]
pub struct ListingFactory {
    kind: String,
    path: String,
}

impl ListingFactory {
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
        }
    }
}

impl ModelFactory for ListingFactory {
    fn name(&self) -> &str {
        "listing"
    }

    fn is_incremental(&self) -> bool {
        false
    }

    fn create(&self, _model: &ModelGraph, run: &mut GenerationRun) -> Result<Vec<Artifact>> {
        if run.is_preparation() {
            return Ok(Vec::new());
        }

        let mut content = String::new();
        for emitted in run.emitted() {
            content.push_str(&emitted.kind);
            content.push_str(": ");
            content.push_str(&emitted.path);
            content.push('\n');
        }

        Ok(vec![
            Artifact::new(&self.kind, &self.path, content).with_origin(self.name()),
        ])
    }
}
