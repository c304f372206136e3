use std::collections::BTreeSet;

use indexmap::IndexMap;
use modelgen_core::replace_vars;
use serde::{Deserialize, Serialize};

/// Attribute holding the identifier of a template a node renders with.
pub const TEMPLATE_ATTRIBUTE: &str = "template";

/// A node in a model graph.
///
/// Nodes carry a type tag used for factory matching, a name, string
/// attributes and child nodes. The generator never mutates nodes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelNode {
    /// Type tag, matched through the [`TypeHierarchy`](crate::TypeHierarchy).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node name (may be empty).
    #[serde(default)]
    pub name: String,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Child nodes in document order.
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Create a node without attributes or children.
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Children of the given type.
    pub fn children_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = &'a ModelNode> {
        self.children.iter().filter(move |c| c.node_type == node_type)
    }

    /// Iterate over this node and all descendants in document (pre-)order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Templates referenced anywhere in this subtree.
    pub fn template_refs(&self) -> BTreeSet<String> {
        self.descendants()
            .filter_map(|n| n.attr(TEMPLATE_ATTRIBUTE))
            .map(str::to_string)
            .collect()
    }

    /// Substitute `${var}` placeholders in names and attributes of the subtree.
    pub fn replace_vars(&mut self, vars: &IndexMap<String, String>) {
        self.name = replace_vars(&self.name, vars);
        for value in self.attributes.values_mut() {
            *value = replace_vars(value, vars);
        }
        for child in &mut self.children {
            child.replace_vars(vars);
        }
    }
}

/// Pre-order iterator over a node subtree.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a ModelNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ModelNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelNode {
        ModelNode::new("package", "shop")
            .with_child(
                ModelNode::new("entity", "Order")
                    .with_attr("template", "entity.tera")
                    .with_child(ModelNode::new("field", "id")),
            )
            .with_child(ModelNode::new("entity", "Customer").with_attr("template", "entity.tera"))
            .with_child(ModelNode::new("view", "Dashboard").with_attr("template", "view.tera"))
    }

    #[test]
    fn test_descendants_document_order() {
        let node = sample();
        let names: Vec<_> = node.descendants().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["shop", "Order", "id", "Customer", "Dashboard"]);
    }

    #[test]
    fn test_template_refs_deduplicated() {
        let refs = sample().template_refs();
        let refs: Vec<_> = refs.iter().map(String::as_str).collect();
        assert_eq!(refs, vec!["entity.tera", "view.tera"]);
    }

    #[test]
    fn test_children_of_type() {
        let node = sample();
        assert_eq!(node.children_of_type("entity").count(), 2);
        assert_eq!(node.children_of_type("field").count(), 0);
    }

    #[test]
    fn test_replace_vars_recursive() {
        let vars = IndexMap::from([("pkg".to_string(), "com.example".to_string())]);
        let mut node = ModelNode::new("entity", "${pkg}.Order")
            .with_child(ModelNode::new("target-file", "").with_attr("path", "${pkg}/Order.java"));

        node.replace_vars(&vars);

        assert_eq!(node.name, "com.example.Order");
        assert_eq!(node.children[0].attr("path"), Some("com.example/Order.java"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let node: ModelNode = toml::from_str(
            r#"
            type = "parameterized-template"
            name = "greeting"

            [attributes]
            template = "greeting.tera"
            who = "world"

            [[children]]
            type = "target-file"

            [children.attributes]
            path = "hello.txt"
            "#,
        )
        .unwrap();

        assert_eq!(node.node_type, "parameterized-template");
        assert_eq!(node.attr("who"), Some("world"));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].attr("path"), Some("hello.txt"));
        assert!(node.children[0].name.is_empty());
    }
}
