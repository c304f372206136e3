//! Template rendering used by the built-in template factory.

mod engine;

use eyre::Result;
use indexmap::IndexMap;

pub use engine::TeraEngine;

/// Renders a template, identified by its id, with string arguments.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_id: &str, args: &IndexMap<String, String>) -> Result<String>;
}
