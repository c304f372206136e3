//! File-based model source.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use walkdir::WalkDir;

use crate::{ModelEntry, ModelError, ModelGraph, ModelNode, ModelSource, TypeHierarchy};

/// Loads one model entry per TOML fragment file below a model directory.
///
/// Templates live below a separate template directory; a template's
/// identifier is its path relative to that directory, `/`-separated.
/// `${var}` placeholders in node names and attributes are replaced at parse
/// time.
///
/// # Example
///
/// ```ignore
/// let source = DirectoryModelSource::new("model", "templates")
///     .with_vars(vars)
///     .with_types(types);
///
/// let graph = source.parse()?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryModelSource {
    model_dir: PathBuf,
    template_dir: PathBuf,
    extension: String,
    types: TypeHierarchy,
    vars: IndexMap<String, String>,
}

impl DirectoryModelSource {
    /// Create a source reading `*.toml` fragments from `model_dir`.
    pub fn new(model_dir: impl Into<PathBuf>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            template_dir: template_dir.into(),
            extension: "toml".to_string(),
            types: TypeHierarchy::new(),
            vars: IndexMap::new(),
        }
    }

    /// Use a different fragment file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Use the given type table for parsed graphs.
    pub fn with_types(mut self, types: TypeHierarchy) -> Self {
        self.types = types;
        self
    }

    /// Variables substituted into parsed nodes.
    pub fn with_vars(mut self, vars: IndexMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// The model directory.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// The template directory.
    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    fn load_entry(&self, path: &Path) -> Result<ModelEntry, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut root: ModelNode = toml::from_str(&content).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        root.replace_vars(&self.vars);

        let id = relative_id(&self.model_dir, path).unwrap_or_else(|| path.display().to_string());
        tracing::debug!("Adding model file: {}", id);
        Ok(ModelEntry::new(id, root).with_source(path))
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension)
    }
}

impl ModelSource for DirectoryModelSource {
    fn parse(&self) -> Result<ModelGraph, ModelError> {
        let mut graph = ModelGraph::new(self.types.clone());

        for dir_entry in WalkDir::new(&self.model_dir).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|source| ModelError::Walk {
                path: self.model_dir.clone(),
                source,
            })?;
            if dir_entry.file_type().is_file() && self.has_extension(dir_entry.path()) {
                graph.push(self.load_entry(dir_entry.path())?);
            }
        }

        tracing::debug!(
            "Parsed {} model entries from {}",
            graph.len(),
            self.model_dir.display()
        );
        Ok(graph)
    }

    fn parse_changed(&self, files: &[PathBuf]) -> Result<ModelGraph, ModelError> {
        let mut graph = ModelGraph::new(self.types.clone());
        for file in files {
            if !self.is_model_file(file) {
                continue;
            }
            if file.is_file() {
                graph.push(self.load_entry(file)?);
            } else {
                tracing::debug!("Model file '{}' no longer exists", file.display());
            }
        }
        Ok(graph)
    }

    fn template_id(&self, path: &Path) -> Option<String> {
        relative_id(&self.template_dir, path)
    }

    fn is_model_file(&self, path: &Path) -> bool {
        self.entry_id(path).is_some()
    }

    fn entry_id(&self, path: &Path) -> Option<String> {
        if !self.has_extension(path) {
            return None;
        }
        relative_id(&self.model_dir, path)
    }
}

/// `/`-separated path of `path` relative to `base`, if `path` lies inside `base`.
fn relative_id(base: &Path, path: &Path) -> Option<String> {
    let relative = match path.strip_prefix(base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            let base = base.canonicalize().ok()?;
            let path = path.canonicalize().ok()?;
            path.strip_prefix(&base).ok()?.to_path_buf()
        }
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
