//! Factory for parameterized template nodes.
//!
//! A `parameterized-template` node names a template and declares default
//! arguments as its attributes. Each `target-file` child produces one
//! artifact at its `path`, rendered with the defaults overridden by the
//! child's own attributes:
//!
//! ```toml
//! type = "parameterized-template"
//! name = "readme"
//!
//! [attributes]
//! template = "readme.tera"
//! title = "Untitled"
//!
//! [[children]]
//! type = "target-file"
//! [children.attributes]
//! path = "docs/README.md"
//! title = "Docs"
//! ```
//!
//! A node with a `producer` attribute gets its target files from the
//! [`TargetFileListProducer`] registered under that name instead; its
//! `target-file` children are then ignored.

use std::sync::Arc;

use eyre::{Result, WrapErr, eyre};
use indexmap::IndexMap;
use modelgen_core::Artifact;
use modelgen_model::{ModelNode, TEMPLATE_ATTRIBUTE};

use crate::{factory::ArtifactFactory, pipeline::GenerationRun, templates::TemplateEngine};

pub const PARAMETERIZED_TEMPLATE: &str = "parameterized-template";
pub const TARGET_FILE: &str = "target-file";
pub const PATH_ATTRIBUTE: &str = "path";
pub const PRODUCER_ATTRIBUTE: &str = "producer";
/// Artifact kind used for rendered target files.
pub const FILE_ARTIFACT: &str = "file";

/// One file a template is rendered into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    /// Path relative to the artifact folder.
    pub path: String,
    /// Overrides for the template's declared arguments.
    pub args: IndexMap<String, String>,
}

impl TargetFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: IndexMap::new(),
        }
    }

    /// Override one template argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    fn from_node(template: &ModelNode, target: &ModelNode) -> Result<Self> {
        let path = target.attr(PATH_ATTRIBUTE).ok_or_else(|| {
            eyre!(
                "target file of '{}' has no '{}' attribute",
                template.name,
                PATH_ATTRIBUTE
            )
        })?;

        Ok(Self {
            path: path.to_string(),
            args: target
                .attributes
                .iter()
                .filter(|(key, _)| key.as_str() != PATH_ATTRIBUTE)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }
}

/// Computes the target files of a template node at generation time.
///
/// Used for templates whose outputs depend on data the model does not spell
/// out file by file. Producers are registered on the [`TemplateFactory`] by
/// name and selected through the node's `producer` attribute.
///
/// # Example
///
/// ```ignore
/// struct Locales;
///
/// impl TargetFileListProducer for Locales {
///     fn target_files(&self, template: &ModelNode) -> Result<Vec<TargetFile>> {
///         Ok(["en", "de"]
///             .iter()
///             .map(|lang| TargetFile::new(format!("{lang}/messages.txt")).with_arg("lang", *lang))
///             .collect())
///     }
/// }
///
/// let factory = TemplateFactory::new(engine).with_producer("locales", Locales);
/// ```
pub trait TargetFileListProducer: Send + Sync {
    /// The files to render `template` into.
    fn target_files(&self, template: &ModelNode) -> Result<Vec<TargetFile>>;
}

/// Renders `parameterized-template` nodes through a [`TemplateEngine`].
#[derive(Clone)]
pub struct TemplateFactory<E> {
    engine: E,
    kind: String,
    producers: IndexMap<String, Arc<dyn TargetFileListProducer>>,
}

impl<E: TemplateEngine> TemplateFactory<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            kind: FILE_ARTIFACT.to_string(),
            producers: IndexMap::new(),
        }
    }

    /// Emit artifacts of another kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Register a target file list producer under `name`.
    pub fn with_producer(
        mut self,
        name: impl Into<String>,
        producer: impl TargetFileListProducer + 'static,
    ) -> Self {
        self.producers.insert(name.into(), Arc::new(producer));
        self
    }

    fn defaults(node: &ModelNode) -> IndexMap<String, String> {
        node.attributes
            .iter()
            .filter(|(key, _)| key.as_str() != TEMPLATE_ATTRIBUTE && key.as_str() != PRODUCER_ATTRIBUTE)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn target_files(&self, node: &ModelNode) -> Result<Vec<TargetFile>> {
        let Some(name) = node.attr(PRODUCER_ATTRIBUTE) else {
            let targets = node
                .children_of_type(TARGET_FILE)
                .map(|target| TargetFile::from_node(node, target))
                .collect::<Result<Vec<_>>>()?;
            tracing::debug!(
                "Using target file list of '{}': {} elements",
                node.name,
                targets.len()
            );
            return Ok(targets);
        };

        let producer = self.producers.get(name).ok_or_else(|| {
            eyre!(
                "template '{}' names unknown target file list producer '{}'",
                node.name,
                name
            )
        })?;
        tracing::debug!("Using target file list producer '{}' for '{}'", name, node.name);
        producer
            .target_files(node)
            .wrap_err_with(|| format!("target file list producer '{name}' failed"))
    }

    fn target_args(
        node: &ModelNode,
        target: TargetFile,
        defaults: &IndexMap<String, String>,
    ) -> Result<(String, IndexMap<String, String>)> {
        let mut args = defaults.clone();
        for (key, value) in target.args {
            if !defaults.contains_key(&key) {
                return Err(eyre!(
                    "argument '{}' of target file '{}' is not declared by template '{}'",
                    key,
                    target.path,
                    node.name
                ));
            }
            args.insert(key, value);
        }

        Ok((target.path, args))
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for TemplateFactory<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFactory")
            .field("engine", &self.engine)
            .field("kind", &self.kind)
            .field("producers", &self.producers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: TemplateEngine> ArtifactFactory for TemplateFactory<E> {
    fn name(&self) -> &str {
        PARAMETERIZED_TEMPLATE
    }

    fn accepts(&self) -> &str {
        PARAMETERIZED_TEMPLATE
    }

    fn create(&self, node: &ModelNode, run: &mut GenerationRun) -> Result<Vec<Artifact>> {
        let template = node
            .attr(TEMPLATE_ATTRIBUTE)
            .ok_or_else(|| eyre!("template '{}' has no '{}' attribute", node.name, TEMPLATE_ATTRIBUTE))?;

        let targets = self.target_files(node)?;
        if targets.is_empty() {
            return Err(eyre!("template '{}' has no target files", node.name));
        }

        let defaults = Self::defaults(node);
        let resolved = targets
            .into_iter()
            .map(|target| Self::target_args(node, target, &defaults))
            .collect::<Result<Vec<_>>>()?;

        if run.is_preparation() {
            return Ok(Vec::new());
        }

        resolved
            .into_iter()
            .map(|(path, args)| -> Result<Artifact> {
                let content = self.engine.render(template, &args)?;
                Ok(Artifact::new(&self.kind, path, content)
                    .with_template(template)
                    .with_origin(PARAMETERIZED_TEMPLATE))
            })
            .collect()
    }
}
