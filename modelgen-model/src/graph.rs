use std::{
    collections::{BTreeSet, HashSet},
    path::PathBuf,
};

use crate::{ModelNode, TypeHierarchy};

/// A self-describing model fragment, the unit of incremental regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// Stable identifier (the relative file path for file-based sources).
    pub id: String,
    /// File the entry was loaded from, if any.
    pub source: Option<PathBuf>,
    /// Root node of the fragment.
    pub root: ModelNode,
}

impl ModelEntry {
    /// Create an entry without a backing file.
    pub fn new(id: impl Into<String>, root: ModelNode) -> Self {
        Self {
            id: id.into(),
            source: None,
            root,
        }
    }

    /// Record the backing file.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Templates referenced by any node of this entry.
    pub fn template_refs(&self) -> BTreeSet<String> {
        self.root.template_refs()
    }
}

/// A parsed model: the type table plus entries in document order.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    types: TypeHierarchy,
    entries: Vec<ModelEntry>,
}

impl ModelGraph {
    /// Create an empty graph using the given type table.
    pub fn new(types: TypeHierarchy) -> Self {
        Self {
            types,
            entries: Vec::new(),
        }
    }

    /// Add an entry (builder style).
    pub fn with_entry(mut self, entry: ModelEntry) -> Self {
        self.push(entry);
        self
    }

    /// Add an entry, replacing an existing entry with the same id in place.
    pub fn push(&mut self, entry: ModelEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the entry with `id`, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<ModelEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// The type table.
    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Find an entry by id.
    pub fn entry(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Every node paired with its entry, in document order.
    pub fn nodes(&self) -> impl Iterator<Item = (&ModelEntry, &ModelNode)> {
        self.entries
            .iter()
            .flat_map(|entry| entry.root.descendants().map(move |node| (entry, node)))
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Check if the graph has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A graph with the same type table holding only the given entries,
    /// kept in document order. Unknown ids are ignored.
    pub fn restrict<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> ModelGraph {
        let wanted: HashSet<&str> = ids.into_iter().collect();
        ModelGraph {
            types: self.types.clone(),
            entries: self
                .entries
                .iter()
                .filter(|e| wanted.contains(e.id.as_str()))
                .cloned()
                .collect(),
        }
    }
}
