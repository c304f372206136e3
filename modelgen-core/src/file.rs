use std::{
    ffi::OsString,
    fs, io,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::{Artifact, TargetFolder, TargetFolders};

/// Result of persisting one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistResult {
    /// The file was created or its content replaced.
    Written,
    /// The file already had identical content and was left alone.
    SkippedUnchanged,
    /// The file exists and the folder's override policy protects it.
    SkippedNoOverride,
}

/// Errors raised while persisting an artifact.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no target folder configured for artifact kind '{kind}'")]
    UnknownArtifactKind { kind: String },

    #[error(
        "directory '{}' does not exist, but folder '{folder}' does not allow creation",
        directory.display()
    )]
    FolderMissing { folder: String, directory: PathBuf },

    #[error("artifact path '{path}' must be relative and stay inside folder '{folder}'")]
    InvalidPath { folder: String, path: String },

    #[error("failed to {action} '{}'", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        PersistError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true for errors caused by the folder configuration rather than I/O.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, PersistError::Io { .. })
    }

    /// The configuration key responsible for a configuration error.
    pub fn config_key(&self) -> Option<String> {
        match self {
            PersistError::UnknownArtifactKind { kind } => Some(format!("artifacts.{kind}")),
            PersistError::FolderMissing { folder, .. } | PersistError::InvalidPath { folder, .. } => {
                Some(format!("folders.{folder}"))
            }
            PersistError::Io { .. } => None,
        }
    }
}

/// Path of the temporary sibling used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes artifacts into their configured target folders.
///
/// Every write goes through a `.tmp` sibling which is compared with the
/// existing file. Unchanged files keep their timestamps, so downstream
/// incremental builds of the generated sources stay quiet.
#[derive(Debug, Clone, Default)]
pub struct Persister {
    folders: TargetFolders,
}

impl Persister {
    /// Create a persister for the given folder mapping.
    pub fn new(folders: TargetFolders) -> Self {
        Self { folders }
    }

    /// The folder mapping.
    pub fn folders(&self) -> &TargetFolders {
        &self.folders
    }

    /// Resolve the final on-disk path of an artifact.
    ///
    /// Creates the folder directory when the folder allows it.
    pub fn target_path(&self, artifact: &Artifact) -> Result<PathBuf, PersistError> {
        self.locate(artifact).map(|(_, path)| path)
    }

    fn locate(&self, artifact: &Artifact) -> Result<(&TargetFolder, PathBuf), PersistError> {
        let folder = self.folders.resolve(artifact.kind())?;
        let relative = Path::new(artifact.path());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if artifact.path().is_empty() || escapes {
            return Err(PersistError::InvalidPath {
                folder: folder.name.clone(),
                path: artifact.path().to_string(),
            });
        }
        let path = folder.ensure_directory()?.join(relative);
        Ok((folder, path))
    }

    /// Persist one artifact.
    pub fn write(&self, artifact: &Artifact) -> Result<PersistResult, PersistError> {
        let (folder, path) = self.locate(artifact)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PersistError::io("create directory", parent, e))?;
        }

        if path.exists() && !folder.policy.allows(artifact.path()) {
            tracing::debug!(
                "Skipped (no override): {} [{}]",
                path.display(),
                artifact.origin().unwrap_or_default()
            );
            return Ok(PersistResult::SkippedNoOverride);
        }

        let result = replace_if_changed(&path, artifact.content())?;
        match result {
            PersistResult::Written => tracing::info!(
                "Generated: {} [{}]",
                path.display(),
                artifact.origin().unwrap_or_default()
            ),
            _ => tracing::debug!(
                "Omitted: {} [{}]",
                path.display(),
                artifact.origin().unwrap_or_default()
            ),
        }
        Ok(result)
    }
}

fn replace_if_changed(path: &Path, content: &[u8]) -> Result<PersistResult, PersistError> {
    let tmp = temp_path(path);
    let outcome = fs::write(&tmp, content)
        .map_err(|e| PersistError::io("write temporary file", &tmp, e))
        .and_then(|()| compare_and_replace(path, &tmp, content));

    if outcome.is_err() && tmp.exists() {
        // best effort, keep the original error
        let _ = fs::remove_file(&tmp);
    }
    outcome
}

fn compare_and_replace(path: &Path, tmp: &Path, content: &[u8]) -> Result<PersistResult, PersistError> {
    let unchanged = match fs::read(path) {
        Ok(existing) => existing == content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(PersistError::io("read", path, e)),
    };

    if unchanged {
        fs::remove_file(tmp).map_err(|e| PersistError::io("remove temporary file", tmp, e))?;
        return Ok(PersistResult::SkippedUnchanged);
    }

    fs::rename(tmp, path).map_err(|e| PersistError::io("rename temporary file to", path, e))?;
    Ok(PersistResult::Written)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::OverridePolicy;

    fn persister(dir: &Path, policy: OverridePolicy) -> Persister {
        Persister::new(TargetFolders::new().with(
            "file",
            TargetFolder::new("main", dir).creatable(true).override_policy(policy),
        ))
    }

    fn no_temp_files(dir: &Path) -> bool {
        fs::read_dir(dir)
            .unwrap()
            .flatten()
            .all(|e| e.path().extension().is_none_or(|ext| ext != "tmp"))
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(temp_path(Path::new("a/b.rs")), PathBuf::from("a/b.rs.tmp"));
    }

    #[test]
    fn test_write_creates_file_and_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let persister = persister(&out, OverridePolicy::AllowAll);

        let artifact = Artifact::new("file", "a/b/c.txt", "nested");
        let result = persister.write(&artifact).unwrap();

        assert_eq!(result, PersistResult::Written);
        assert_eq!(fs::read_to_string(out.join("a/b/c.txt")).unwrap(), "nested");
        assert!(no_temp_files(&out.join("a/b")));
    }

    #[test]
    fn test_write_same_content_is_skipped() {
        let temp = TempDir::new().unwrap();
        let persister = persister(temp.path(), OverridePolicy::AllowAll);
        let artifact = Artifact::new("file", "same.txt", "content");

        assert_eq!(persister.write(&artifact).unwrap(), PersistResult::Written);
        assert_eq!(
            persister.write(&artifact).unwrap(),
            PersistResult::SkippedUnchanged
        );
        assert!(no_temp_files(temp.path()));
    }

    #[test]
    fn test_write_changed_content_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        fs::write(&path, "old").unwrap();

        let persister = persister(temp.path(), OverridePolicy::AllowAll);
        let result = persister
            .write(&Artifact::new("file", "file.txt", "new"))
            .unwrap();

        assert_eq!(result, PersistResult::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(no_temp_files(temp.path()));
    }

    #[test]
    fn test_deny_all_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stub.rs");
        fs::write(&path, "user code").unwrap();

        let persister = persister(temp.path(), OverridePolicy::DenyAll);
        let result = persister
            .write(&Artifact::new("file", "stub.rs", "generated"))
            .unwrap();

        assert_eq!(result, PersistResult::SkippedNoOverride);
        assert_eq!(fs::read_to_string(&path).unwrap(), "user code");
        assert!(no_temp_files(temp.path()));
    }

    #[test]
    fn test_deny_all_still_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let persister = persister(temp.path(), OverridePolicy::DenyAll);

        let result = persister
            .write(&Artifact::new("file", "stub.rs", "generated"))
            .unwrap();

        assert_eq!(result, PersistResult::Written);
    }

    #[test]
    fn test_deny_if_matches_only_protects_matching_paths() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("UserImpl.java"), "hand written").unwrap();
        fs::write(temp.path().join("User.java"), "old").unwrap();

        let policy = OverridePolicy::deny_if_matches("*Impl.java").unwrap();
        let persister = persister(temp.path(), policy);

        let protected = persister
            .write(&Artifact::new("file", "UserImpl.java", "generated"))
            .unwrap();
        let replaced = persister
            .write(&Artifact::new("file", "User.java", "generated"))
            .unwrap();

        assert_eq!(protected, PersistResult::SkippedNoOverride);
        assert_eq!(replaced, PersistResult::Written);
    }

    #[test]
    fn test_missing_folder_without_create_is_config_error() {
        let temp = TempDir::new().unwrap();
        let folders = TargetFolders::new().with(
            "file",
            TargetFolder::new("main", temp.path().join("missing")),
        );
        let persister = Persister::new(folders);

        let err = persister
            .write(&Artifact::new("file", "a.txt", "x"))
            .unwrap_err();

        assert!(err.is_config_error());
        assert_eq!(err.config_key().as_deref(), Some("folders.main"));
        assert!(!temp.path().join("missing").exists());
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let persister = Persister::default();
        let err = persister
            .write(&Artifact::new("file", "a.txt", "x"))
            .unwrap_err();

        assert!(matches!(err, PersistError::UnknownArtifactKind { .. }));
    }

    #[test]
    fn test_escaping_path_is_rejected() {
        let temp = TempDir::new().unwrap();
        let persister = persister(temp.path(), OverridePolicy::AllowAll);

        let err = persister
            .write(&Artifact::new("file", "../outside.txt", "x"))
            .unwrap_err();

        assert!(matches!(err, PersistError::InvalidPath { .. }));
    }
}
