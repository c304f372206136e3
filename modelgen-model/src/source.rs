use std::path::{Path, PathBuf};

use crate::{ModelError, ModelGraph};

/// Something that can produce a [`ModelGraph`].
///
/// Implementations parse a concrete model notation; the generator only
/// relies on this trait. Incremental regeneration additionally needs to
/// classify changed files as templates or model fragments.
pub trait ModelSource {
    /// Parse the complete model.
    fn parse(&self) -> Result<ModelGraph, ModelError>;

    /// Parse only the given model fragment files.
    ///
    /// Files that are not model fragments are ignored.
    fn parse_changed(&self, files: &[PathBuf]) -> Result<ModelGraph, ModelError>;

    /// Template identifier for a file, or `None` if the file is not a template.
    fn template_id(&self, path: &Path) -> Option<String>;

    /// Whether a file is a model fragment of this source.
    fn is_model_file(&self, path: &Path) -> bool;

    /// Id of the entry a model fragment file is loaded as.
    ///
    /// Must not require the file to exist, so deleted fragments can be
    /// evicted from caches.
    fn entry_id(&self, path: &Path) -> Option<String>;
}
