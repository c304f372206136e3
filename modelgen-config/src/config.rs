use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use indexmap::IndexMap;
use modelgen_core::{OverridePolicy, TargetFolder, TargetFolders, has_vars, replace_vars};
use modelgen_model::{DirectoryModelSource, TypeHierarchy};
use serde::Deserialize;

use crate::{Error, Result, SourceContext};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "modelgen.toml";

/// Root of `modelgen.toml`.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Project metadata
    #[serde(default)]
    pub project: ProjectConfig,

    /// Variables substituted as `${name}` into directories and model attributes
    #[serde(default)]
    pub variables: IndexMap<String, String>,

    /// Target folders by name
    #[serde(default)]
    pub folders: IndexMap<String, FolderConfig>,

    /// Artifact kind -> folder name
    #[serde(default)]
    pub artifacts: IndexMap<String, String>,

    /// Model and template locations
    pub model: Option<ModelConfig>,

    /// Error policy
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(skip)]
    base_dir: PathBuf,

    #[serde(skip)]
    origin: SourceContext,
}

/// `[project]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Project name (informational)
    #[serde(default)]
    pub name: String,
}

/// A `[folders.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderConfig {
    /// Directory, relative to the configuration file unless absolute
    pub directory: String,
    /// Create the directory when missing
    #[serde(default)]
    pub create: bool,
    /// Override protection for existing files
    #[serde(default, rename = "override")]
    pub policy: OverrideConfig,
}

/// Override setting of a folder.
///
/// Written as `"allow"`, `"deny"` or `{ deny-if-matches = "<glob>" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideConfig {
    #[default]
    Allow,
    Deny,
    DenyIfMatches(String),
}

/// `[model]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory holding model fragments
    pub directory: String,
    /// Directory holding templates
    pub templates: String,
    /// Fragment file extension
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Node type -> parent type
    #[serde(default)]
    pub types: IndexMap<String, String>,
}

fn default_extension() -> String {
    "toml".to_string()
}

/// `[generation]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerationConfig {
    /// Abort the run on the first factory error
    #[serde(default)]
    pub factory_errors_fatal: bool,
    /// Abort the run on the first persistence error
    #[serde(default = "default_true")]
    pub persist_errors_fatal: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            factory_errors_fatal: false,
            persist_errors_fatal: true,
        }
    }
}

impl FromStr for Config {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_with_filename(s, CONFIG_FILENAME)
    }
}

impl Config {
    /// Parse a configuration file; relative directories resolve against its parent.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        let config = Self::from_str_with_filename(&content, &path.display().to_string())?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Ok(config.with_base_dir(base_dir))
    }

    /// Parse a configuration from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        let origin = SourceContext::new(content, filename);
        let mut config: Self = toml::from_str(content).map_err(|e| origin.parse_error(e))?;
        config.origin = origin;
        config.base_dir = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    /// Resolve relative directories against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Substitute variables and resolve a configured path.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = PathBuf::from(replace_vars(raw, &self.variables));
        if path.is_relative() {
            self.base_dir.join(path)
        } else {
            path
        }
    }

    /// Build the artifact-kind to target-folder mapping.
    pub fn target_folders(&self) -> Result<TargetFolders> {
        let mut folders = TargetFolders::new();
        for (kind, name) in &self.artifacts {
            let folder = self
                .folders
                .get(name)
                .ok_or_else(|| self.origin.unknown_folder_error(kind, name))?;
            let target = TargetFolder::new(name, self.resolve_path(&folder.directory))
                .creatable(folder.create)
                .override_policy(self.override_policy(name, &folder.policy)?);
            folders.insert(kind, target);
        }
        Ok(folders)
    }

    /// Build the node type table from `[model.types]`.
    pub fn type_hierarchy(&self) -> Result<TypeHierarchy> {
        let mut types = TypeHierarchy::new();
        if let Some(model) = &self.model {
            for (ty, parent) in &model.types {
                types
                    .declare(ty, Some(parent.as_str()))
                    .map_err(|e| self.origin.validation_error(e.to_string(), ty))?;
            }
        }
        Ok(types)
    }

    /// Build the directory model source described by `[model]`, if any.
    pub fn model_source(&self) -> Result<Option<DirectoryModelSource>> {
        let Some(model) = &self.model else {
            return Ok(None);
        };
        let source = DirectoryModelSource::new(
            self.resolve_path(&model.directory),
            self.resolve_path(&model.templates),
        )
        .with_extension(&model.extension)
        .with_types(self.type_hierarchy()?)
        .with_vars(self.variables.clone());
        Ok(Some(source))
    }

    fn override_policy(&self, folder: &str, policy: &OverrideConfig) -> Result<OverridePolicy> {
        match policy {
            OverrideConfig::Allow => Ok(OverridePolicy::AllowAll),
            OverrideConfig::Deny => Ok(OverridePolicy::DenyAll),
            OverrideConfig::DenyIfMatches(pattern) => OverridePolicy::deny_if_matches(pattern)
                .map_err(|e| self.origin.invalid_glob_error(folder, pattern, e)),
        }
    }

    fn check_vars(&self, key: &str, value: &str) -> Result<()> {
        if has_vars(&replace_vars(value, &self.variables)) {
            return Err(self.origin.unknown_variable_error(key, value));
        }
        Ok(())
    }

    /// Validate the configuration after parsing.
    fn validate(&self) -> Result<()> {
        for (name, folder) in &self.folders {
            if folder.directory.trim().is_empty() {
                return Err(self
                    .origin
                    .validation_error(format!("folder '{name}' has an empty directory"), name));
            }
            self.check_vars(&format!("folders.{name}.directory"), &folder.directory)?;
            self.override_policy(name, &folder.policy)?;
        }

        for (kind, name) in &self.artifacts {
            if !self.folders.contains_key(name) {
                return Err(self.origin.unknown_folder_error(kind, name));
            }
        }

        if let Some(model) = &self.model {
            self.check_vars("model.directory", &model.directory)?;
            self.check_vars("model.templates", &model.templates)?;
            self.type_hierarchy()?;
        }
        Ok(())
    }
}
