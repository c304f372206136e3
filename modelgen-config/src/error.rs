use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for configuration operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Keeps the configuration text and filename around so errors raised after
/// parsing (validation, folder building) can still point into the file.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Get the filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Span of the first occurrence of `needle`, if present.
    pub fn find(&self, needle: &str) -> Option<SourceSpan> {
        self.src
            .find(needle)
            .map(|offset| SourceSpan::from((offset, needle.len())))
    }

    /// Create a parse error from a toml error.
    pub fn parse_error(&self, source: toml::de::Error) -> Box<Error> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            source,
        })
    }

    /// Create a validation error pointing at `needle` when it can be found.
    pub fn validation_error(&self, message: impl Into<String>, needle: &str) -> Box<Error> {
        Box::new(Error::Validation {
            src: self.named_source(),
            span: self.find(needle),
            message: message.into(),
        })
    }

    /// Create an unknown folder error.
    pub fn unknown_folder_error(&self, kind: &str, folder: &str) -> Box<Error> {
        Box::new(Error::UnknownFolder {
            src: self.named_source(),
            span: self.find(&format!("\"{folder}\"")),
            kind: kind.to_string(),
            folder: folder.to_string(),
        })
    }

    /// Create an invalid glob error.
    pub fn invalid_glob_error(
        &self,
        folder: &str,
        pattern: &str,
        reason: impl std::fmt::Display,
    ) -> Box<Error> {
        Box::new(Error::InvalidGlob {
            src: self.named_source(),
            span: self.find(pattern),
            folder: folder.to_string(),
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        })
    }

    /// Create an unknown variable error.
    pub fn unknown_variable_error(&self, key: &str, value: &str) -> Box<Error> {
        Box::new(Error::UnknownVariable {
            src: self.named_source(),
            span: self.find(value),
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{}'", path.display())]
    #[diagnostic(help("create a modelgen.toml describing target folders and artifacts"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration")]
    #[diagnostic(code(modelgen::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("artifact kind '{kind}' is routed to unknown folder '{folder}'")]
    #[diagnostic(
        code(modelgen::unknown_folder),
        help("declare the folder with a [folders.{folder}] table")
    )]
    UnknownFolder {
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown folder")]
        span: Option<SourceSpan>,
        kind: String,
        folder: String,
    },

    #[error("invalid override pattern '{pattern}' in folder '{folder}'")]
    #[diagnostic(code(modelgen::invalid_glob), help("{reason}"))]
    InvalidGlob {
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid glob")]
        span: Option<SourceSpan>,
        folder: String,
        pattern: String,
        reason: String,
    },

    #[error("'{key}' uses an undefined variable: '{value}'")]
    #[diagnostic(
        code(modelgen::unknown_variable),
        help("define the variable in the [variables] table")
    )]
    UnknownVariable {
        #[source_code]
        src: NamedSource<String>,
        #[label("undefined variable")]
        span: Option<SourceSpan>,
        key: String,
        value: String,
    },

    #[error("{message}")]
    #[diagnostic(code(modelgen::validation_error))]
    Validation {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },
}
