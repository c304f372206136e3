use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or loading a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("failed to scan model directory '{}'", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("declaring '{parent}' as parent of '{ty}' would create a type cycle")]
    CyclicType { ty: String, parent: String },

    #[error("type '{ty}' is already declared with parent '{existing}', cannot redeclare with '{requested}'")]
    ConflictingParent {
        ty: String,
        existing: String,
        requested: String,
    },
}
