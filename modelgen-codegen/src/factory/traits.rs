//! Factory traits.

use eyre::Result;
use modelgen_core::Artifact;
use modelgen_model::{ModelGraph, ModelNode};

use crate::pipeline::GenerationRun;

/// Turns one model node into zero or more artifacts.
///
/// Each factory is invoked twice per run. In the preparation pass
/// (`run.is_preparation()`) it registers the fully-qualified names its
/// artifacts will have through [`GenerationRun::register_reference`]; any
/// artifacts it returns there are discarded. In the generation pass it
/// renders complete artifacts, resolving references through
/// [`GenerationRun::snippet`].
///
/// # Example
///
/// ```ignore
/// struct EntityFactory;
///
/// impl ArtifactFactory for EntityFactory {
///     fn name(&self) -> &str { "entity" }
///     fn accepts(&self) -> &str { "entity" }
///
///     fn create(&self, node: &ModelNode, run: &mut GenerationRun) -> Result<Vec<Artifact>> {
///         let fqn = format!("com.example.{}", node.name);
///         if run.is_preparation() {
///             run.register_reference(&node.name, fqn);
///             return Ok(Vec::new());
///         }
///         let path = format!("{}.java", fqn.replace('.', "/"));
///         Ok(vec![Artifact::new("source", path, format!("class {} {{}}", node.name))])
///     }
/// }
/// ```
pub trait ArtifactFactory: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// The node type this factory handles. Subtypes are accepted too.
    fn accepts(&self) -> &str;

    /// Whether the factory takes part in incremental runs.
    fn is_incremental(&self) -> bool {
        true
    }

    /// Create the artifacts for `node` in the run's current phase.
    ///
    /// # Errors
    ///
    /// An error is recorded against the node and the node is skipped for
    /// this factory; it only aborts the run under a strict error policy.
    fn create(&self, node: &ModelNode, run: &mut GenerationRun) -> Result<Vec<Artifact>>;
}

/// Produces artifacts from the whole model once per phase, after every node
/// has been visited.
pub trait ModelFactory: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether the factory takes part in incremental runs.
    fn is_incremental(&self) -> bool {
        true
    }

    /// Create the artifacts for the whole model in the run's current phase.
    ///
    /// In incremental runs `model` holds only the regenerated entries during
    /// the generation pass.
    fn create(&self, model: &ModelGraph, run: &mut GenerationRun) -> Result<Vec<Artifact>>;
}
