//! Explicit node type hierarchy.

use indexmap::IndexMap;

use crate::ModelError;

/// Supertype table used to match factories against node types.
///
/// A factory registered for a type receives nodes of that type and of every
/// type that (transitively) declares it as parent. Types that were never
/// declared have no parent and only match themselves.
///
/// # Example
///
/// ```
/// use modelgen_model::TypeHierarchy;
///
/// let mut types = TypeHierarchy::new();
/// types.declare("entity", Some("node")).unwrap();
/// types.declare("aggregate", Some("entity")).unwrap();
///
/// assert!(types.is_assignable("node", "aggregate"));
/// assert!(!types.is_assignable("aggregate", "entity"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: IndexMap<String, Option<String>>,
}

impl TypeHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from `(type, parent)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Result<Self, ModelError> {
        let mut types = Self::new();
        for (ty, parent) in pairs {
            types.declare(ty, parent)?;
        }
        Ok(types)
    }

    /// Declare a type and its direct parent.
    ///
    /// Redeclaring a type with the same parent is a no-op. Declarations that
    /// would make a type its own ancestor are rejected.
    pub fn declare(&mut self, ty: &str, parent: Option<&str>) -> Result<(), ModelError> {
        if let Some(Some(existing)) = self.parents.get(ty) {
            if parent != Some(existing.as_str()) {
                return Err(ModelError::ConflictingParent {
                    ty: ty.to_string(),
                    existing: existing.clone(),
                    requested: parent.unwrap_or("<none>").to_string(),
                });
            }
            return Ok(());
        }

        if let Some(parent) = parent {
            if self.ancestors(parent).any(|ancestor| ancestor == ty) {
                return Err(ModelError::CyclicType {
                    ty: ty.to_string(),
                    parent: parent.to_string(),
                });
            }
            self.parents.entry(parent.to_string()).or_insert(None);
        }
        self.parents
            .insert(ty.to_string(), parent.map(str::to_string));
        Ok(())
    }

    /// The direct parent of a type.
    pub fn parent(&self, ty: &str) -> Option<&str> {
        self.parents.get(ty).and_then(|p| p.as_deref())
    }

    /// Check if a type has been declared (directly or as someone's parent).
    pub fn contains(&self, ty: &str) -> bool {
        self.parents.contains_key(ty)
    }

    /// Iterate over a type followed by its ancestors, nearest first.
    pub fn ancestors<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(Some(ty), move |current| self.parent(current))
    }

    /// Whether a node of type `ty` may be handed to something that accepts `base`.
    pub fn is_assignable(&self, base: &str, ty: &str) -> bool {
        self.ancestors(ty).any(|ancestor| ancestor == base)
    }

    /// Iterate over all declared types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> TypeHierarchy {
        TypeHierarchy::from_pairs([
            ("entity", Some("node")),
            ("aggregate", Some("entity")),
            ("value-object", Some("node")),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_match() {
        let types = hierarchy();
        assert!(types.is_assignable("entity", "entity"));
        assert!(types.is_assignable("unknown", "unknown"));
    }

    #[test]
    fn test_supertype_matches_subtype() {
        let types = hierarchy();
        assert!(types.is_assignable("node", "entity"));
        assert!(types.is_assignable("node", "aggregate"));
        assert!(types.is_assignable("entity", "aggregate"));
    }

    #[test]
    fn test_unrelated_types_do_not_match() {
        let types = hierarchy();
        assert!(!types.is_assignable("entity", "node"));
        assert!(!types.is_assignable("value-object", "aggregate"));
        assert!(!types.is_assignable("entity", "unknown"));
    }

    #[test]
    fn test_ancestors_order() {
        let types = hierarchy();
        let chain: Vec<_> = types.ancestors("aggregate").collect();
        assert_eq!(chain, vec!["aggregate", "entity", "node"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut types = hierarchy();
        let err = types.declare("node", Some("aggregate")).unwrap_err();
        assert!(matches!(err, ModelError::CyclicType { .. }));

        let err = types.declare("self", Some("self")).unwrap_err();
        assert!(matches!(err, ModelError::CyclicType { .. }));
    }

    #[test]
    fn test_conflicting_parent_rejected() {
        let mut types = hierarchy();
        assert!(types.declare("entity", Some("node")).is_ok());

        let err = types.declare("entity", Some("value-object")).unwrap_err();
        assert!(matches!(err, ModelError::ConflictingParent { .. }));
    }

    #[test]
    fn test_parent_declared_implicitly() {
        let types = hierarchy();
        assert!(types.contains("node"));
        assert_eq!(types.parent("node"), None);
        assert_eq!(types.parent("entity"), Some("node"));
    }
}
