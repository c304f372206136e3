use std::path::PathBuf;

use eyre::Result;
use indexmap::{IndexMap, IndexSet};
use modelgen_model::{ModelEntry, ModelGraph, ModelSource};
use serde::Serialize;

use crate::pipeline::{Generator, RunReport};

/// A model entry rendered through a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub template_id: String,
    pub entry_id: String,
}

impl DependencyEdge {
    pub fn new(template_id: impl Into<String>, entry_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            entry_id: entry_id.into(),
        }
    }
}

/// Maps templates to the model entries that depend on them, so a set of
/// changed files can be turned into the smallest model worth regenerating.
///
/// The cache is filled from one full parse of the model source the first
/// time a template is looked up, plus any edges recorded by tracked runs.
/// Model files passed to [`changed`](Self::changed) keep it current. It is
/// only emptied by [`clear`](Self::clear); a tracker kept across unrelated
/// sessions will miss entries added since it was built.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    dependents: IndexMap<String, IndexSet<String>>,
    model: Option<ModelGraph>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observed template dependency.
    pub fn record(&mut self, edge: DependencyEdge) {
        self.dependents
            .entry(edge.template_id)
            .or_default()
            .insert(edge.entry_id);
    }

    /// Whether the full parse backing the cache has been done.
    pub fn is_cached(&self) -> bool {
        self.model.is_some()
    }

    /// Drop every cached edge and the cached model.
    pub fn clear(&mut self) {
        tracing::debug!("Clearing template dependency cache");
        self.dependents.clear();
        self.model = None;
    }

    fn ensure_cache(&mut self, source: &dyn ModelSource) -> Result<()> {
        if self.model.is_some() {
            return Ok(());
        }

        tracing::info!("Building template dependency cache");
        let model = source.parse()?;
        for entry in model.entries() {
            for template in entry.template_refs() {
                self.record(DependencyEdge::new(template, &entry.id));
            }
        }
        tracing::debug!(
            "Cached {} templates over {} model entries",
            self.dependents.len(),
            model.len()
        );
        self.model = Some(model);
        Ok(())
    }

    /// Ids of the model entries that use `template_id`.
    pub fn dependents(&mut self, source: &dyn ModelSource, template_id: &str) -> Result<Vec<String>> {
        self.ensure_cache(source)?;
        Ok(self
            .dependents
            .get(template_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// The model entries affected by `files`.
    ///
    /// Changed templates pull in their cached dependents. Changed model
    /// files are parsed on their own and replace the cached version of
    /// their entry, including its template edges; model files that no longer
    /// exist are evicted. Other files are ignored.
    ///
    /// The full parse backing the cache only happens when a template changed.
    pub fn changed(&mut self, source: &dyn ModelSource, files: &[PathBuf]) -> Result<ModelGraph> {
        let mut templates = Vec::new();
        let mut fragments = Vec::new();

        for file in files {
            if let Some(template) = source.template_id(file) {
                templates.push(template);
            } else if source.is_model_file(file) {
                fragments.push(file.clone());
            } else {
                tracing::debug!("Ignoring changed file '{}'", file.display());
            }
        }

        if !templates.is_empty() {
            self.ensure_cache(source)?;
        }

        let parsed = source.parse_changed(&fragments)?;
        for file in &fragments {
            if let Some(id) = source.entry_id(file) {
                if parsed.entry(&id).is_none() {
                    self.evict(&id);
                }
            }
        }
        for entry in parsed.entries() {
            self.refresh(entry);
        }

        let mut marked: IndexSet<String> = IndexSet::new();
        for template in &templates {
            let dependents = self.dependents(source, template)?;
            tracing::info!(
                "Template '{}' changed, {} dependent entries",
                template,
                dependents.len()
            );
            marked.extend(dependents);
        }

        let Some(model) = &self.model else {
            return Ok(parsed);
        };
        marked.extend(parsed.entries().iter().map(|e| e.id.clone()));
        Ok(model.restrict(marked.iter().map(String::as_str)))
    }

    /// Replace the cached version of a reparsed entry.
    fn refresh(&mut self, entry: &ModelEntry) {
        let templates = entry.template_refs();
        for (template, ids) in self.dependents.iter_mut() {
            if !templates.contains(template) {
                ids.shift_remove(&entry.id);
            }
        }
        for template in templates {
            self.record(DependencyEdge::new(template, &entry.id));
        }
        if let Some(model) = self.model.as_mut() {
            model.push(entry.clone());
        }
    }

    /// Forget an entry whose model file is gone.
    fn evict(&mut self, id: &str) {
        tracing::info!("Model file of '{}' was removed, dropping it from the cache", id);
        for ids in self.dependents.values_mut() {
            ids.shift_remove(id);
        }
        self.dependents.retain(|_, ids| !ids.is_empty());
        if let Some(model) = self.model.as_mut() {
            model.remove(id);
        }
    }

    /// Regenerate only what `files` affect, in incremental mode.
    ///
    /// The preparation pass still covers the whole cached model so that
    /// references to entries outside the regenerated set resolve.
    pub fn regenerate(
        &mut self,
        generator: &Generator,
        source: &dyn ModelSource,
        files: &[PathBuf],
    ) -> Result<RunReport> {
        let graph = self.changed(source, files)?;
        if graph.is_empty() {
            tracing::info!("No model entries affected by {} changed files", files.len());
            return Ok(RunReport::new(true));
        }

        self.ensure_cache(source)?;
        let full = self.model.take().unwrap_or_else(|| graph.clone());
        tracing::info!("Regenerating {} of {} model entries", graph.len(), full.len());

        let report = generator.run_incremental_with(&full, &graph, Some(&mut *self));
        self.model = Some(full);
        report
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use modelgen_model::{ModelError, ModelNode, TypeHierarchy};

    use super::*;

    /// In-memory source: entries keyed by "<id>", templates by "t/<id>".
    struct Fixed {
        entries: Vec<ModelEntry>,
    }

    impl ModelSource for Fixed {
        fn parse(&self) -> Result<ModelGraph, ModelError> {
            let mut graph = ModelGraph::new(TypeHierarchy::new());
            for entry in &self.entries {
                graph.push(entry.clone());
            }
            Ok(graph)
        }

        fn parse_changed(&self, files: &[PathBuf]) -> Result<ModelGraph, ModelError> {
            let mut graph = ModelGraph::new(TypeHierarchy::new());
            for entry in &self.entries {
                if files.iter().any(|f| f == Path::new(&entry.id)) {
                    let mut changed = entry.clone();
                    changed.root.name = format!("{} (edited)", changed.root.name);
                    graph.push(changed);
                }
            }
            Ok(graph)
        }

        fn template_id(&self, path: &Path) -> Option<String> {
            path.strip_prefix("t")
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        }

        fn is_model_file(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "toml")
        }

        fn entry_id(&self, path: &Path) -> Option<String> {
            self.is_model_file(path)
                .then(|| path.to_string_lossy().into_owned())
        }
    }

    fn entry(id: &str, template: &str) -> ModelEntry {
        ModelEntry::new(id, ModelNode::new("item", id).with_attr("template", template))
    }

    fn source() -> Fixed {
        Fixed {
            entries: vec![
                entry("a.toml", "x.tera"),
                entry("b.toml", "y.tera"),
                entry("c.toml", "x.tera"),
            ],
        }
    }

    #[test]
    fn test_dependents_builds_cache_lazily() {
        let source = source();
        let mut tracker = DependencyTracker::new();
        assert!(!tracker.is_cached());

        let deps = tracker.dependents(&source, "x.tera").unwrap();
        assert_eq!(deps, vec!["a.toml", "c.toml"]);
        assert!(tracker.is_cached());
        assert!(tracker.dependents(&source, "z.tera").unwrap().is_empty());
    }

    #[test]
    fn test_changed_template_marks_dependents() {
        let source = source();
        let mut tracker = DependencyTracker::new();

        let graph = tracker.changed(&source, &[PathBuf::from("t/y.tera")]).unwrap();
        let ids: Vec<_> = graph.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b.toml"]);
    }

    #[test]
    fn test_changed_fragment_wins_over_cache() {
        let source = source();
        let mut tracker = DependencyTracker::new();

        let files = [
            PathBuf::from("t/x.tera"),
            PathBuf::from("a.toml"),
            PathBuf::from("README.md"),
        ];
        let graph = tracker.changed(&source, &files).unwrap();

        let ids: Vec<_> = graph.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a.toml", "c.toml"]);
        assert_eq!(graph.entry("a.toml").unwrap().root.name, "a.toml (edited)");
    }

    #[test]
    fn test_fragment_only_change_skips_full_parse() {
        let source = source();
        let mut tracker = DependencyTracker::new();

        let graph = tracker.changed(&source, &[PathBuf::from("b.toml")]).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(!tracker.is_cached());
    }

    #[test]
    fn test_fragment_edit_refreshes_cache() {
        let mut source = source();
        let mut tracker = DependencyTracker::new();
        assert_eq!(tracker.dependents(&source, "x.tera").unwrap(), vec!["a.toml", "c.toml"]);

        source.entries[0] = entry("a.toml", "y.tera");
        tracker.changed(&source, &[PathBuf::from("a.toml")]).unwrap();

        assert_eq!(tracker.dependents(&source, "x.tera").unwrap(), vec!["c.toml"]);
        assert_eq!(tracker.dependents(&source, "y.tera").unwrap(), vec!["b.toml", "a.toml"]);

        // a later template change serves the reparsed entry from the cache
        let graph = tracker.changed(&source, &[PathBuf::from("t/y.tera")]).unwrap();
        let ids: Vec<_> = graph.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a.toml", "b.toml"]);
        assert_eq!(graph.entry("a.toml").unwrap().root.name, "a.toml (edited)");
    }

    #[test]
    fn test_deleted_fragment_is_evicted() {
        let mut source = source();
        let mut tracker = DependencyTracker::new();
        tracker.dependents(&source, "x.tera").unwrap();

        source.entries.remove(0);
        let graph = tracker.changed(&source, &[PathBuf::from("a.toml")]).unwrap();
        assert!(graph.is_empty());

        assert_eq!(tracker.dependents(&source, "x.tera").unwrap(), vec!["c.toml"]);
        let graph = tracker.changed(&source, &[PathBuf::from("t/x.tera")]).unwrap();
        let ids: Vec<_> = graph.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c.toml"]);
    }

    #[test]
    fn test_recorded_edges_and_clear() {
        let source = source();
        let mut tracker = DependencyTracker::new();
        tracker.record(DependencyEdge::new("x.tera", "b.toml"));

        let deps = tracker.dependents(&source, "x.tera").unwrap();
        assert_eq!(deps, vec!["b.toml", "a.toml", "c.toml"]);

        tracker.clear();
        assert!(!tracker.is_cached());
        let deps = tracker.dependents(&source, "x.tera").unwrap();
        assert_eq!(deps, vec!["a.toml", "c.toml"]);
    }
}
