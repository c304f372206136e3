//! Registry of factories keyed by the node type they accept.

use modelgen_model::{ModelNode, TypeHierarchy};

use super::{ArtifactFactory, ModelFactory};

/// Holds the factories registered by the host, in registration order.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: Vec<Box<dyn ArtifactFactory>>,
    model_factories: Vec<Box<dyn ModelFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node factory.
    pub fn register(&mut self, factory: impl ArtifactFactory + 'static) {
        tracing::debug!(
            "Registered factory '{}' for type '{}'",
            factory.name(),
            factory.accepts()
        );
        self.factories.push(Box::new(factory));
    }

    /// Register a whole-model factory.
    pub fn register_model_factory(&mut self, factory: impl ModelFactory + 'static) {
        tracing::debug!("Registered model factory '{}'", factory.name());
        self.model_factories.push(Box::new(factory));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, factory: impl ArtifactFactory + 'static) -> Self {
        self.register(factory);
        self
    }

    /// Builder form of [`register_model_factory`](Self::register_model_factory).
    pub fn with_model_factory(mut self, factory: impl ModelFactory + 'static) -> Self {
        self.register_model_factory(factory);
        self
    }

    /// Factories whose accepted type is `node_type` or one of its ancestors.
    pub fn factories_for(&self, types: &TypeHierarchy, node_type: &str) -> Vec<&dyn ArtifactFactory> {
        self.factories
            .iter()
            .filter(|f| types.is_assignable(f.accepts(), node_type))
            .map(|f| f.as_ref())
            .collect()
    }

    /// Returns true if any factory accepts `node`.
    pub fn wants(&self, types: &TypeHierarchy, node: &ModelNode) -> bool {
        self.factories
            .iter()
            .any(|f| types.is_assignable(f.accepts(), &node.node_type))
    }

    pub fn model_factories(&self) -> impl Iterator<Item = &dyn ModelFactory> {
        self.model_factories.iter().map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.factories.len() + self.model_factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field(
                "factories",
                &self.factories.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .field(
                "model_factories",
                &self.model_factories.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use eyre::Result;
    use modelgen_core::Artifact;
    use modelgen_model::ModelGraph;

    use super::*;
    use crate::pipeline::GenerationRun;

    struct Accepts(&'static str, &'static str);

    impl ArtifactFactory for Accepts {
        fn name(&self) -> &str {
            self.0
        }

        fn accepts(&self) -> &str {
            self.1
        }

        fn create(&self, _node: &ModelNode, _run: &mut GenerationRun) -> Result<Vec<Artifact>> {
            Ok(Vec::new())
        }
    }

    struct Summary;

    impl ModelFactory for Summary {
        fn name(&self) -> &str {
            "summary"
        }

        fn create(&self, _model: &ModelGraph, _run: &mut GenerationRun) -> Result<Vec<Artifact>> {
            Ok(Vec::new())
        }
    }

    fn types() -> TypeHierarchy {
        TypeHierarchy::from_pairs([
            ("node", None),
            ("entity", Some("node")),
            ("view", Some("node")),
        ])
        .unwrap()
    }

    fn registry() -> FactoryRegistry {
        FactoryRegistry::new()
            .with(Accepts("any", "node"))
            .with(Accepts("entities", "entity"))
            .with(Accepts("views", "view"))
            .with_model_factory(Summary)
    }

    #[test]
    fn test_factories_for_subtype_includes_base_factories() {
        let registry = registry();
        let names: Vec<_> = registry
            .factories_for(&types(), "entity")
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(names, vec!["any", "entities"]);
    }

    #[test]
    fn test_base_type_does_not_match_subtype_factories() {
        let registry = registry();
        let names: Vec<_> = registry
            .factories_for(&types(), "node")
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(names, vec!["any"]);
    }

    #[test]
    fn test_wants() {
        let registry = FactoryRegistry::new().with(Accepts("views", "view"));
        let types = types();
        assert!(registry.wants(&types, &ModelNode::new("view", "Dashboard")));
        assert!(!registry.wants(&types, &ModelNode::new("entity", "Order")));
        assert!(!registry.wants(&types, &ModelNode::new("unknown", "X")));
    }

    #[test]
    fn test_len_counts_model_factories() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.model_factories().count(), 1);
        assert!(format!("{registry:?}").contains("summary"));
    }
}
