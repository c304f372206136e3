/// A generated artifact waiting to be persisted.
///
/// Artifacts are produced by exactly one factory invocation and are
/// immutable once built. The persistence layer resolves [`Artifact::kind`]
/// to a target folder and writes [`Artifact::content`] to
/// [`Artifact::path`] relative to that folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    kind: String,
    path: String,
    content: Vec<u8>,
    template: Option<String>,
    origin: Option<String>,
}

impl Artifact {
    /// Create an artifact of the given kind at a folder-relative path.
    pub fn new(
        kind: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            content: content.into(),
            template: None,
            origin: None,
        }
    }

    /// Record the template this artifact was rendered from.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Record who produced this artifact (shown in log output).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// The artifact kind, used to look up the target folder.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Path relative to the target folder.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw content bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content as UTF-8, if it is valid UTF-8.
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Template identifier, if the artifact was rendered from one.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Producer information.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}
