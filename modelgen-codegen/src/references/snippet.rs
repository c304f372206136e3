//! Per-artifact import and reference bookkeeping.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{ReferenceEntry, ReferenceRegistry};

/// Collects the imports and references one artifact needs while it is being
/// rendered.
///
/// References are resolved through the run's [`ReferenceRegistry`] as soon
/// as they are required. An unresolved reference is imported under its
/// unique name.
#[derive(Debug)]
pub struct SnippetContext<'a> {
    registry: &'a ReferenceRegistry,
    imports: BTreeSet<String>,
    references: IndexMap<String, Option<String>>,
}

impl<'a> SnippetContext<'a> {
    /// Create an empty context reading from `registry`.
    pub fn new(registry: &'a ReferenceRegistry) -> Self {
        Self {
            registry,
            imports: BTreeSet::new(),
            references: IndexMap::new(),
        }
    }

    /// Add an import for a fully-qualified name.
    pub fn require_import(&mut self, fqn: impl Into<String>) {
        self.imports.insert(fqn.into());
    }

    /// Require a reference by unique name and return the name to use in the
    /// rendered text.
    pub fn require_reference(&mut self, unique: &str) -> String {
        if let Some(Some(fqn)) = self.references.get(unique) {
            return fqn.clone();
        }

        let resolved = self.registry.get(unique).map(str::to_string);
        let import = resolved.clone().unwrap_or_else(|| unique.to_string());
        self.imports.insert(import.clone());
        self.references.insert(unique.to_string(), resolved);
        import
    }

    /// The fully-qualified name for `unique`, or `unique` itself when it
    /// cannot be resolved.
    pub fn resolve(&self, unique: &str) -> String {
        if let Some(Some(fqn)) = self.references.get(unique) {
            return fqn.clone();
        }
        self.registry
            .get(unique)
            .map(str::to_string)
            .unwrap_or_else(|| unique.to_string())
    }

    /// Imports in sorted order.
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// All references required so far, in the order they were required.
    pub fn references(&self) -> Vec<ReferenceEntry> {
        self.references
            .iter()
            .map(|(unique, fqn)| ReferenceEntry {
                unique_name: unique.clone(),
                fully_qualified_name: fqn.clone(),
            })
            .collect()
    }

    /// Required references without a fully-qualified name.
    pub fn unresolved(&self) -> Vec<&str> {
        self.references
            .iter()
            .filter(|(_, fqn)| fqn.is_none())
            .map(|(unique, _)| unique.as_str())
            .collect()
    }
}
