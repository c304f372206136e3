//! Run-scoped registry of unique names and their fully-qualified names.

use std::{cell::RefCell, collections::BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;

/// A unique name and the fully-qualified name it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    /// Model-level name, unique within one run.
    pub unique_name: String,
    /// Name the artifact was registered under, `None` while unresolved.
    pub fully_qualified_name: Option<String>,
}

impl ReferenceEntry {
    /// Returns true if a fully-qualified name was found.
    pub fn is_resolved(&self) -> bool {
        self.fully_qualified_name.is_some()
    }
}

/// Maps model-level unique names to the fully-qualified names of generated
/// artifacts.
///
/// Factories register names during the preparation pass and look them up
/// while rendering in the generation pass. Lookups of names that were never
/// registered return `None` and are remembered, so the driver can report
/// them once the run is over.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: IndexMap<String, String>,
    misses: RefCell<BTreeSet<String>>,
}

impl ReferenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unique` as resolving to `fqn`, returning the previous value.
    pub fn put(&mut self, unique: impl Into<String>, fqn: impl Into<String>) -> Option<String> {
        let unique = unique.into();
        let fqn = fqn.into();
        let previous = self.entries.insert(unique.clone(), fqn);

        if let Some(old) = &previous {
            let current = &self.entries[&unique];
            if old != current {
                tracing::warn!(
                    "Reference '{}' re-registered: '{}' replaces '{}'",
                    unique,
                    current,
                    old
                );
            }
        }

        previous
    }

    /// Look up the fully-qualified name for `unique`.
    pub fn get(&self, unique: &str) -> Option<&str> {
        match self.entries.get(unique) {
            Some(fqn) => Some(fqn.as_str()),
            None => {
                self.misses.borrow_mut().insert(unique.to_string());
                None
            }
        }
    }

    /// Returns true if `unique` has been registered. Does not count as a miss.
    pub fn contains(&self, unique: &str) -> bool {
        self.entries.contains_key(unique)
    }

    /// Names that were looked up but never registered, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        self.misses
            .borrow()
            .iter()
            .filter(|name| !self.entries.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    /// Iterate over registered names in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.put("Order", "com.example.Order"), None);
        assert_eq!(registry.get("Order"), Some("com.example.Order"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_put_returns_previous_value() {
        let mut registry = ReferenceRegistry::new();
        registry.put("Order", "a.Order");
        let previous = registry.put("Order", "b.Order");

        assert_eq!(previous.as_deref(), Some("a.Order"));
        assert_eq!(registry.get("Order"), Some("b.Order"));
    }

    #[test]
    fn test_miss_is_reported_until_registered() {
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.get("Customer"), None);
        assert_eq!(registry.get("Invoice"), None);
        assert_eq!(registry.unresolved(), vec!["Customer", "Invoice"]);

        registry.put("Customer", "com.example.Customer");
        assert_eq!(registry.unresolved(), vec!["Invoice"]);
    }

    #[test]
    fn test_contains_does_not_record_miss() {
        let registry = ReferenceRegistry::new();
        assert!(!registry.contains("Order"));
        assert!(registry.unresolved().is_empty());
    }
}
