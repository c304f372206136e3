//! Diagnostics collected while a generation run traverses the model.

use serde::Serialize;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A node or artifact was skipped because something failed.
    Error,
    /// Generation went on, but the output may be incomplete.
    Warning,
    /// Something was deliberately left out, e.g. a non-incremental factory.
    Info,
}

impl Severity {
    /// Returns true if this is [`Severity::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is [`Severity::Warning`].
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic raised during one pass of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The pass that produced this diagnostic ("prepare" or "generate").
    pub phase: String,
    pub message: String,
    /// Model location, e.g. `entities/order.toml#Order`.
    pub location: Option<String>,
    /// Factory involved, if any.
    pub factory: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            phase: phase.into(),
            message: message.into(),
            location: None,
            factory: None,
        }
    }

    pub fn error(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, phase, message)
    }

    pub fn warning(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, phase, message)
    }

    pub fn info(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, phase, message)
    }

    /// Attach a model location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach the name of the factory that raised it.
    pub fn from_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.phase, self.message)?;
        if let Some(factory) = &self.factory {
            write!(f, " (factory {})", factory)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_location() {
        let diag = Diagnostic::error("generate", "template not found").at("order.toml#Order");
        assert!(diag.severity.is_error());
        assert_eq!(diag.location.as_deref(), Some("order.toml#Order"));
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::warning("prepare", "no factory matched any node");
        assert_eq!(diag.to_string(), "warning[prepare]: no factory matched any node");

        let diag = Diagnostic::error("generate", "boom")
            .from_factory("entity")
            .at("a.toml#A");
        assert_eq!(
            diag.to_string(),
            "error[generate]: boom (factory entity) (at a.toml#A)"
        );
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
