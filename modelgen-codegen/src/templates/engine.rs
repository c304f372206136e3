use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{Result, WrapErr};
use indexmap::IndexMap;
use tera::{Context, Tera};

use super::TemplateEngine;

/// Tera templates read from a directory.
///
/// The template file is read again on every render so edits made between
/// incremental runs are picked up.
#[derive(Debug, Clone)]
pub struct TeraEngine {
    template_dir: PathBuf,
    autoescape: bool,
}

impl TeraEngine {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            autoescape: false,
        }
    }

    /// Escape HTML in substituted values.
    pub fn autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }
}

impl TemplateEngine for TeraEngine {
    fn render(&self, template_id: &str, args: &IndexMap<String, String>) -> Result<String> {
        let path = self.template_dir.join(template_id);
        let source = fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read template '{}'", path.display()))?;

        let mut context = Context::new();
        for (key, value) in args {
            context.insert(key.as_str(), value);
        }

        Tera::one_off(&source, &context, self.autoescape)
            .wrap_err_with(|| format!("failed to render template '{template_id}'"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn args(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_reads_template_from_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("greet.tera"), "Hello, {{ name }}!").unwrap();

        let engine = TeraEngine::new(temp.path());
        let out = engine.render("greet.tera", &args(&[("name", "World")])).unwrap();
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_render_sees_edits() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.tera");
        let engine = TeraEngine::new(temp.path());

        fs::write(&path, "v1 {{ x }}").unwrap();
        assert_eq!(engine.render("t.tera", &args(&[("x", "a")])).unwrap(), "v1 a");

        fs::write(&path, "v2 {{ x }}").unwrap();
        assert_eq!(engine.render("t.tera", &args(&[("x", "a")])).unwrap(), "v2 a");
    }

    #[test]
    fn test_missing_template() {
        let temp = TempDir::new().unwrap();
        let engine = TeraEngine::new(temp.path());
        let err = engine.render("missing.tera", &IndexMap::new()).unwrap_err();
        assert!(err.to_string().contains("failed to read template"));
    }

    #[test]
    fn test_undefined_variable_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("t.tera"), "{{ nope }}").unwrap();
        let engine = TeraEngine::new(temp.path());
        assert!(engine.render("t.tera", &IndexMap::new()).is_err());
    }
}
