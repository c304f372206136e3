use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use indexmap::IndexMap;

use crate::PersistError;

/// How to handle files that already exist in a target folder.
#[derive(Debug, Clone, Default)]
pub enum OverridePolicy {
    /// Existing files are replaced when their content changes.
    #[default]
    AllowAll,
    /// Existing files are never touched (hand-edited stubs).
    DenyAll,
    /// Existing files whose relative path matches the glob are never touched.
    DenyIfMatches(GlobMatcher),
}

impl OverridePolicy {
    /// Build a [`OverridePolicy::DenyIfMatches`] policy from a glob pattern.
    ///
    /// `*` does not cross `/`; use `**` to match nested directories.
    pub fn deny_if_matches(pattern: &str) -> Result<Self, globset::Error> {
        let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
        Ok(Self::DenyIfMatches(glob.compile_matcher()))
    }

    /// Whether an existing file at `relative_path` may be overwritten.
    pub fn allows(&self, relative_path: &str) -> bool {
        match self {
            OverridePolicy::AllowAll => true,
            OverridePolicy::DenyAll => false,
            OverridePolicy::DenyIfMatches(matcher) => !matcher.is_match(relative_path),
        }
    }
}

/// A directory that receives generated artifacts.
#[derive(Debug, Clone)]
pub struct TargetFolder {
    /// Folder name as configured.
    pub name: String,
    /// Root directory for artifacts routed to this folder.
    pub directory: PathBuf,
    /// Create the directory if it does not exist.
    pub create: bool,
    /// Override protection for existing files.
    pub policy: OverridePolicy,
}

impl TargetFolder {
    /// Create a folder that must already exist and allows overwriting.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            create: false,
            policy: OverridePolicy::AllowAll,
        }
    }

    /// Allow or forbid creating the directory on first write.
    pub fn creatable(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the override policy.
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Make sure the folder directory exists, creating it when allowed.
    pub fn ensure_directory(&self) -> Result<&Path, PersistError> {
        if !self.directory.is_dir() {
            if !self.create {
                return Err(PersistError::FolderMissing {
                    folder: self.name.clone(),
                    directory: self.directory.clone(),
                });
            }
            std::fs::create_dir_all(&self.directory).map_err(|source| PersistError::Io {
                action: "create directory",
                path: self.directory.clone(),
                source,
            })?;
        }
        Ok(&self.directory)
    }
}

/// Mapping from artifact kind to the folder that receives it.
#[derive(Debug, Clone, Default)]
pub struct TargetFolders {
    folders: IndexMap<String, TargetFolder>,
}

impl TargetFolders {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an artifact kind to a folder (builder style).
    pub fn with(mut self, kind: impl Into<String>, folder: TargetFolder) -> Self {
        self.insert(kind, folder);
        self
    }

    /// Route an artifact kind to a folder.
    pub fn insert(&mut self, kind: impl Into<String>, folder: TargetFolder) {
        self.folders.insert(kind.into(), folder);
    }

    /// Look up the folder for an artifact kind.
    pub fn get(&self, kind: &str) -> Option<&TargetFolder> {
        self.folders.get(kind)
    }

    /// Look up the folder for an artifact kind, failing with a configuration error.
    pub fn resolve(&self, kind: &str) -> Result<&TargetFolder, PersistError> {
        self.get(kind)
            .ok_or_else(|| PersistError::UnknownArtifactKind {
                kind: kind.to_string(),
            })
    }

    /// Iterate over `(kind, folder)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetFolder)> {
        self.folders.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of routed artifact kinds.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Check if no artifact kind is routed.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_policy_allow_and_deny() {
        assert!(OverridePolicy::AllowAll.allows("src/main.rs"));
        assert!(!OverridePolicy::DenyAll.allows("src/main.rs"));
    }

    #[test]
    fn test_policy_deny_if_matches() {
        let policy = OverridePolicy::deny_if_matches("**/*Impl.java").unwrap();
        assert!(!policy.allows("com/example/ServiceImpl.java"));
        assert!(policy.allows("com/example/Service.java"));

        let top_level = OverridePolicy::deny_if_matches("*.md").unwrap();
        assert!(!top_level.allows("README.md"));
        assert!(top_level.allows("docs/guide.md"));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(OverridePolicy::deny_if_matches("a[").is_err());
    }

    #[test]
    fn test_ensure_directory_creates_when_allowed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("gen").join("java");
        let folder = TargetFolder::new("main", &dir).creatable(true);

        folder.ensure_directory().unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_directory_missing_fails() {
        let temp = TempDir::new().unwrap();
        let folder = TargetFolder::new("main", temp.path().join("missing"));

        let err = folder.ensure_directory().unwrap_err();
        assert!(matches!(err, PersistError::FolderMissing { ref folder, .. } if folder == "main"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let folders = TargetFolders::new().with("file", TargetFolder::new("main", "out"));

        assert_eq!(folders.resolve("file").unwrap().name, "main");
        let err = folders.resolve("manifest").unwrap_err();
        assert_eq!(err.config_key().as_deref(), Some("artifacts.manifest"));
    }
}
