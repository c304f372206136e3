//! The two-pass generation driver.

use std::collections::HashSet;

use eyre::Result;
use indexmap::IndexMap;
use modelgen_config::{Config, GenerationConfig};
use modelgen_core::{Artifact, Persister};
use modelgen_model::{ModelEntry, ModelGraph, ModelNode};

use super::{Diagnostic, EmittedArtifact, GenerationRun, Phase, RunReport, RunState};
use crate::{
    factory::FactoryRegistry,
    incremental::{DependencyEdge, DependencyTracker},
};

/// Which failures abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Abort on the first factory error instead of skipping the node.
    pub factory_errors_fatal: bool,
    /// Abort on the first persistence I/O error instead of counting it.
    pub persist_errors_fatal: bool,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            factory_errors_fatal: false,
            persist_errors_fatal: true,
        }
    }
}

impl From<&GenerationConfig> for ErrorPolicy {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            factory_errors_fatal: config.factory_errors_fatal,
            persist_errors_fatal: config.persist_errors_fatal,
        }
    }
}

/// (entry id, node ordinal within the entry, factory slot)
type NodeSlot = (String, usize, usize);

/// Mutable state threaded through one execution.
struct RunContext<'t> {
    run: GenerationRun,
    report: RunReport,
    /// Collects artifacts instead of persisting them when set.
    preview: Option<Vec<Artifact>>,
    tracker: Option<&'t mut DependencyTracker>,
    /// Ids of the generated entries when preparation covers a larger model.
    scope: Option<HashSet<String>>,
    /// Factory invocations that failed in an earlier pass.
    failed: HashSet<NodeSlot>,
    failed_models: HashSet<usize>,
    /// Non-incremental factories already reported as skipped.
    skipped: HashSet<String>,
}

impl<'t> RunContext<'t> {
    fn new(incremental: bool, tracker: Option<&'t mut DependencyTracker>) -> Self {
        Self {
            run: GenerationRun::new(incremental),
            report: RunReport::new(incremental),
            preview: None,
            tracker,
            scope: None,
            failed: HashSet::new(),
            failed_models: HashSet::new(),
            skipped: HashSet::new(),
        }
    }

    fn preview() -> Self {
        let mut ctx = Self::new(false, None);
        ctx.preview = Some(Vec::new());
        ctx
    }

    fn in_scope(&self, entry: &ModelEntry) -> bool {
        self.scope.as_ref().is_none_or(|ids| ids.contains(&entry.id))
    }
}

fn location(entry: &ModelEntry, node: &ModelNode) -> String {
    if node.name.is_empty() {
        format!("{}#{}", entry.id, node.node_type)
    } else {
        format!("{}#{}", entry.id, node.name)
    }
}

/// Drives factories over a model and persists what they produce.
///
/// Every call creates a fresh [`GenerationRun`]: first a preparation pass
/// over the whole model (node factories in document order, then model
/// factories), then a generation pass in the same order where artifacts are
/// persisted as soon as they are produced.
///
/// # Example
///
/// ```ignore
/// let generator = Generator::from_config(&config, factories)?;
/// let report = generator.run(&model)?;
/// println!("{report}");
/// ```
#[derive(Debug)]
pub struct Generator {
    factories: FactoryRegistry,
    persister: Persister,
    policy: ErrorPolicy,
}

impl Generator {
    pub fn new(factories: FactoryRegistry, persister: Persister) -> Self {
        Self {
            factories,
            persister,
            policy: ErrorPolicy::default(),
        }
    }

    /// Build a generator writing to the folders declared in `config`.
    pub fn from_config(config: &Config, factories: FactoryRegistry) -> Result<Self> {
        let folders = config.target_folders()?;
        Ok(Self::new(factories, Persister::new(folders))
            .with_policy(ErrorPolicy::from(&config.generation)))
    }

    /// Use a non-default error policy.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Generate everything for `model`.
    pub fn run(&self, model: &ModelGraph) -> Result<RunReport> {
        let ctx = self.execute(model, model, RunContext::new(false, None))?;
        Ok(ctx.report)
    }

    /// Generate everything for `model`, recording template dependencies.
    pub fn run_tracked(&self, model: &ModelGraph, tracker: &mut DependencyTracker) -> Result<RunReport> {
        let ctx = self.execute(model, model, RunContext::new(false, Some(tracker)))?;
        Ok(ctx.report)
    }

    /// Regenerate `model` incrementally. Non-incremental factories are skipped.
    pub fn run_incremental(
        &self,
        model: &ModelGraph,
        tracker: Option<&mut DependencyTracker>,
    ) -> Result<RunReport> {
        self.run_incremental_with(model, model, tracker)
    }

    /// Regenerate the entries of `generate` incrementally, running the
    /// preparation pass over `prepare`.
    ///
    /// `prepare` is normally the complete model, so references registered by
    /// entries that are not regenerated still resolve. Factory errors raised
    /// while preparing entries outside `generate` are only logged.
    pub fn run_incremental_with(
        &self,
        prepare: &ModelGraph,
        generate: &ModelGraph,
        tracker: Option<&mut DependencyTracker>,
    ) -> Result<RunReport> {
        let mut ctx = RunContext::new(true, tracker);
        ctx.scope = Some(generate.entries().iter().map(|e| e.id.clone()).collect());
        let ctx = self.execute(prepare, generate, ctx)?;
        Ok(ctx.report)
    }

    /// Run both passes and return the artifacts without touching the disk.
    pub fn preview(&self, model: &ModelGraph) -> Result<Vec<Artifact>> {
        let ctx = self.execute(model, model, RunContext::preview())?;
        Ok(ctx.preview.unwrap_or_default())
    }

    fn execute<'t>(
        &self,
        prepare: &ModelGraph,
        generate: &ModelGraph,
        mut ctx: RunContext<'t>,
    ) -> Result<RunContext<'t>> {
        tracing::info!(
            "Starting generation: {} of {} entries, {} factories (incremental: {})",
            generate.len(),
            prepare.len(),
            self.factories.len(),
            ctx.run.is_incremental()
        );

        match self.drive(prepare, generate, &mut ctx) {
            Ok(()) => {
                ctx.run.advance(RunState::Finished)?;
                tracing::info!("Generation finished: {}", ctx.report);
                Ok(ctx)
            }
            Err(err) => {
                ctx.run.fail();
                tracing::error!("Generation failed: {err:#}");
                Err(err)
            }
        }
    }

    fn drive(&self, prepare: &ModelGraph, generate: &ModelGraph, ctx: &mut RunContext<'_>) -> Result<()> {
        ctx.run.advance(RunState::Preparing)?;
        self.count(generate, ctx);
        self.check_coverage(ctx);
        self.traverse(prepare, ctx)?;
        self.run_model_factories(prepare, ctx)?;

        ctx.run.advance(RunState::Generating)?;
        self.traverse(generate, ctx)?;
        self.run_model_factories(generate, ctx)?;

        self.report_unresolved(ctx);
        Ok(())
    }

    /// Count the nodes to generate, warning once per node type no factory
    /// accepts.
    fn count(&self, model: &ModelGraph, ctx: &mut RunContext<'_>) {
        let mut unmatched: IndexMap<&str, usize> = IndexMap::new();

        for (_, node) in model.nodes() {
            ctx.report.total_nodes += 1;
            if self.factories.wants(model.types(), node) {
                ctx.report.matched_nodes += 1;
            } else {
                *unmatched.entry(node.node_type.as_str()).or_default() += 1;
            }
        }

        for (node_type, skipped) in unmatched {
            tracing::warn!("No factory accepts '{}' nodes, skipping {}", node_type, skipped);
            ctx.report.diagnostics.push(Diagnostic::warning(
                Phase::Preparation.as_str(),
                format!("no factory accepts '{node_type}' nodes, {skipped} skipped"),
            ));
        }
    }

    fn traverse(&self, model: &ModelGraph, ctx: &mut RunContext<'_>) -> Result<()> {
        let phase = ctx.run.phase();

        for entry in model.entries() {
            for (ordinal, node) in entry.root.descendants().enumerate() {
                let factories = self.factories.factories_for(model.types(), &node.node_type);

                for (slot, factory) in factories.into_iter().enumerate() {
                    if ctx.run.is_incremental() && !factory.is_incremental() {
                        self.skip_non_incremental(factory.name(), ctx);
                        continue;
                    }
                    let key = (entry.id.clone(), ordinal, slot);
                    if ctx.failed.contains(&key) {
                        continue;
                    }

                    tracing::debug!(
                        "Factory '{}' on {} '{}' ({})",
                        factory.name(),
                        node.node_type,
                        node.name,
                        phase
                    );
                    match factory.create(node, &mut ctx.run) {
                        Ok(artifacts) => self.accept(artifacts, Some(entry), ctx)?,
                        Err(err) => {
                            ctx.failed.insert(key);
                            if !ctx.in_scope(entry) {
                                tracing::debug!(
                                    "Factory '{}' failed on {} outside the regenerated entries: {:#}",
                                    factory.name(),
                                    location(entry, node),
                                    err
                                );
                                continue;
                            }
                            self.factory_failed(factory.name(), &location(entry, node), err, ctx)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn skip_non_incremental(&self, factory: &str, ctx: &mut RunContext<'_>) {
        if !ctx.skipped.insert(factory.to_string()) {
            return;
        }
        tracing::debug!("Skipping non-incremental factory '{}'", factory);
        let phase = ctx.run.phase();
        ctx.report.diagnostics.push(
            Diagnostic::info(phase.as_str(), "not incremental, skipped").from_factory(factory),
        );
    }

    fn run_model_factories(&self, model: &ModelGraph, ctx: &mut RunContext<'_>) -> Result<()> {
        for (slot, factory) in self.factories.model_factories().enumerate() {
            if ctx.run.is_incremental() && !factory.is_incremental() {
                self.skip_non_incremental(factory.name(), ctx);
                continue;
            }
            if ctx.failed_models.contains(&slot) {
                continue;
            }

            tracing::debug!("Model factory '{}' ({})", factory.name(), ctx.run.phase());
            match factory.create(model, &mut ctx.run) {
                Ok(artifacts) => self.accept(artifacts, None, ctx)?,
                Err(err) => {
                    ctx.failed_models.insert(slot);
                    self.factory_failed(factory.name(), "model", err, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn check_coverage(&self, ctx: &mut RunContext<'_>) {
        let report = &mut ctx.report;
        if report.total_nodes == 0 {
            tracing::error!("Model contains no nodes, nothing to generate");
            report
                .diagnostics
                .push(Diagnostic::error(Phase::Preparation.as_str(), "model contains no nodes"));
        } else if report.matched_nodes == 0 {
            tracing::warn!(
                "None of the {} model nodes matched a factory",
                report.total_nodes
            );
            report
                .diagnostics
                .push(Diagnostic::warning(Phase::Preparation.as_str(), "no model node matched a factory"));
        }
    }

    fn accept(
        &self,
        artifacts: Vec<Artifact>,
        entry: Option<&ModelEntry>,
        ctx: &mut RunContext<'_>,
    ) -> Result<()> {
        if ctx.run.is_preparation() {
            if !artifacts.is_empty() {
                tracing::debug!(
                    "Discarding {} artifacts returned during preparation",
                    artifacts.len()
                );
            }
            return Ok(());
        }

        for artifact in artifacts {
            self.emit(artifact, entry, ctx)?;
        }
        Ok(())
    }

    fn emit(&self, artifact: Artifact, entry: Option<&ModelEntry>, ctx: &mut RunContext<'_>) -> Result<()> {
        if let (Some(tracker), Some(template), Some(entry)) =
            (ctx.tracker.as_deref_mut(), artifact.template(), entry)
        {
            tracker.record(DependencyEdge::new(template, &entry.id));
        }

        let mut emitted = EmittedArtifact {
            kind: artifact.kind().to_string(),
            path: artifact.path().to_string(),
            entry: entry.map(|e| e.id.clone()),
            result: None,
        };

        if let Some(collected) = ctx.preview.as_mut() {
            collected.push(artifact);
            ctx.run.record_emitted(emitted);
            return Ok(());
        }

        match self.persister.write(&artifact) {
            Ok(result) => {
                ctx.report.record_file(&artifact, result);
                emitted.result = Some(result);
                ctx.run.record_emitted(emitted);
                Ok(())
            }
            Err(err) if err.is_config_error() => {
                tracing::error!(
                    "Configuration error at '{}': {}",
                    err.config_key().unwrap_or_default(),
                    err
                );
                Err(err.into())
            }
            Err(err) if self.policy.persist_errors_fatal => Err(err.into()),
            Err(err) => {
                tracing::error!("Failed to persist '{}': {}", artifact.path(), err);
                let mut diagnostic = Diagnostic::error("generate", err.to_string()).at(artifact.path());
                if let Some(origin) = artifact.origin() {
                    diagnostic = diagnostic.from_factory(origin);
                }
                ctx.report.record_node_error(diagnostic);
                Ok(())
            }
        }
    }

    fn factory_failed(
        &self,
        factory: &str,
        location: &str,
        err: eyre::Report,
        ctx: &mut RunContext<'_>,
    ) -> Result<()> {
        let phase = ctx.run.phase();
        tracing::error!(
            "Factory '{}' failed on {} ({}): {:#}",
            factory,
            location,
            phase,
            err
        );

        if self.policy.factory_errors_fatal {
            return Err(err.wrap_err(format!("factory '{factory}' failed on {location}")));
        }

        ctx.report.record_node_error(
            Diagnostic::error(phase.as_str(), format!("{err:#}"))
                .from_factory(factory)
                .at(location),
        );
        Ok(())
    }

    fn report_unresolved(&self, ctx: &mut RunContext<'_>) {
        let unresolved = ctx.run.references().unresolved();
        if unresolved.is_empty() {
            return;
        }

        tracing::warn!("Unresolved references: {}", unresolved.join(", "));
        ctx.report.diagnostics.push(Diagnostic::warning(
            "generate",
            format!("{} unresolved references", unresolved.len()),
        ));
        ctx.report.unresolved_references = unresolved;
    }
}
